use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::{self, Write};
use std::time::Duration;

use crate::reference::{IncomeBracket, Language, Region};
use crate::wire::Plan;

const BAR_WIDTH: usize = 30;

pub fn show_regions(regions: &[Region]) {
    println!("\n{}", "=== SELECT YOUR REGION ===".bold());
    let mut group = "";
    for (i, r) in regions.iter().enumerate() {
        if r.group != group {
            group = &r.group;
            println!("{}", group.dimmed());
        }
        println!("  {:>2}. {} {} ({})", i + 1, r.code.bold(), r.name, r.currency_code);
    }
    println!();
}

pub fn show_brackets(region: &Region, brackets: &[IncomeBracket]) {
    println!(
        "\n{} {} {}",
        "=== MONTHLY INCOME IN".bold(),
        region.name.bold(),
        format!("({}) ===", region.currency_code).bold()
    );
    for (i, b) in brackets.iter().enumerate() {
        let label = if b.is_zero() { b.label.red() } else if b.is_low(region) { b.label.yellow() } else { b.label.normal() };
        println!("  {:>2}. {}", i + 1, label);
    }
    println!();
}

pub fn show_languages(languages: &[Language], current: &Language) {
    let list = languages
        .iter()
        .map(|l| if l.code == current.code { format!("[{}]", l.code).bold().to_string() } else { l.code.clone() })
        .collect::<Vec<_>>()
        .join(" ");
    println!("languages: {list}");
}

pub fn show_dashboard(region: &Region, plan: &Plan) {
    let money = |v: f64| region.format_amount(v.max(0.0).round() as u64);

    println!(
        "\n{}",
        "┏━━━━━━━━━━━━━━━━━━━━━━━━ Budget Plan ━━━━━━━━━━━━━━━━━━━━━━━━┓".bold()
    );
    println!(
        "  {} {}   {} {}",
        "Region:".bold(), region.name,
        "Est. net income:".bold(), format!("{} {}", money(plan.estimated_monthly_income), plan.currency).green().bold()
    );
    println!("{}", "┗━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━┛".bold());
    println!("\n{}\n", plan.summary.italic());

    for c in &plan.breakdown {
        let filled = bar(c.percentage, BAR_WIDTH);
        let painted = match parse_hex(&c.color) {
            Some((r, g, b)) => filled.truecolor(r, g, b),
            None => filled.cyan(),
        };
        println!("  {:<14} {} {:>5.1}%  {}", c.name, painted, c.percentage, money(c.amount));
    }
    // Model output only approximately sums to 100.
    if !plan.is_balanced(1.0) {
        println!("  {}", format!("(categories total {:.1}%)", plan.percentage_total()).dimmed());
    }

    println!("\n{}", "Tips".bold().underline());
    for (i, tip) in plan.actionable_tips.iter().enumerate() {
        println!("  {}. {}", i + 1, tip);
    }
    println!("\n{}\n  {}", "Investment".bold().underline(), plan.investment_advice);
    println!("\n{} {}", "Life goal:".bold(), plan.life_goal.green());
    println!("\n  \"{}\"\n", plan.quote.italic().dimmed());
}

pub fn show_error(message: &str) {
    println!("\n{} {}", "Could not build your plan:".red().bold(), message);
    println!("{}", "Enter 't' to try again or pick another bracket.".dimmed());
}

pub fn spinner(message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.blue} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Reads one trimmed line; `None` on EOF.
pub fn prompt(label: &str) -> Option<String> {
    print!("{} ", label.bold());
    let _ = io::stdout().flush();
    let mut s = String::new();
    match io::stdin().read_line(&mut s) {
        Ok(0) | Err(_) => None,
        Ok(_) => Some(s.trim().to_string()),
    }
}

/// A line typed at one of the interactive prompts.
#[derive(Debug, PartialEq, Eq)]
pub enum Input {
    Quit,
    Back,
    Reset,
    Retry,
    Language(String),
    Pick(String),
    Empty,
}

pub fn parse_input(line: &str) -> Input {
    let line = line.trim();
    match line.split_once(char::is_whitespace) {
        Some(("l", code)) => return Input::Language(code.trim().to_string()),
        Some(_) => return Input::Pick(line.to_string()),
        None => {}
    }
    match line {
        "" => Input::Empty,
        "q" => Input::Quit,
        "b" => Input::Back,
        "r" => Input::Reset,
        "t" => Input::Retry,
        other => Input::Pick(other.to_string()),
    }
}

/// 1-based index or case-insensitive code.
pub fn pick_index(pick: &str, len: usize, code_at: impl Fn(usize) -> String) -> Option<usize> {
    match pick.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => Some(n - 1),
        Ok(_) => None,
        Err(_) => (0..len).find(|&i| code_at(i).eq_ignore_ascii_case(pick)),
    }
}

fn bar(percentage: f64, width: usize) -> String {
    let pct = if percentage.is_finite() { percentage.clamp(0.0, 100.0) } else { 0.0 };
    let filled = ((pct / 100.0) * width as f64).round() as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

fn parse_hex(color: &str) -> Option<(u8, u8, u8)> {
    let hex = color.trim().strip_prefix('#')?;
    if hex.len() != 6 || !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    Some((channel(0)?, channel(2)?, channel(4)?))
}

use anyhow::{Context, Result};
use colored::Colorize;
use std::process::{Command, Output};
use std::time::Instant;

use crate::TARGET;

/// One `cargo` invocation in the check pipeline.
struct Step {
    label: &'static str,
    args: &'static [&'static str],
    /// A failing required step aborts the pipeline; others only warn.
    required: bool,
}

const STEPS: &[Step] = &[
    Step {
        label: "hardware target (STM32L072)",
        args: &["check", "-p", "firmware", "--target", TARGET, "--features", "hardware"],
        required: true,
    },
    Step {
        label: "firmware library (no_std, no logging)",
        args: &["check", "-p", "firmware", "--lib", "--target", TARGET],
        required: true,
    },
    Step {
        label: "platform crate (no_std)",
        args: &["check", "-p", "platform", "--target", TARGET, "--no-default-features"],
        required: true,
    },
    Step {
        label: "host build with tracing",
        args: &["check", "-p", "firmware", "--lib", "--features", "std,tracing"],
        required: true,
    },
    Step {
        label: "clippy lints",
        args: &["clippy", "--workspace", "--all-targets", "--", "-D", "warnings"],
        required: false,
    },
    Step {
        label: "code formatting",
        args: &["fmt", "--all", "--check"],
        required: false,
    },
];

pub fn run() -> Result<()> {
    println!();
    println!("{}", "🔍 Checking firmware builds...".cyan().bold());
    println!();

    let total_start = Instant::now();

    for step in STEPS {
        println!("{}", format!("  Checking {}...", step.label).cyan());
        let start = Instant::now();
        let output = cargo(step.args).with_context(|| format!("Failed to run {}", step.label))?;

        if output.status.success() {
            println!(
                "{}",
                format!("  ✓ {} passed in {:.2}s", step.label, start.elapsed().as_secs_f64())
                    .green()
            );
        } else if step.required {
            eprintln!("{}", format!("  ✗ {} failed", step.label).red().bold());
            eprintln!();
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
            anyhow::bail!("{} failed", step.label);
        } else {
            eprintln!("{}", format!("  ⚠ {} reported issues", step.label).yellow().bold());
            eprintln!();
            eprintln!("{}", String::from_utf8_lossy(&output.stderr));
        }
        println!();
    }

    println!(
        "{}",
        format!(
            "✓ All checks completed in {:.2}s",
            total_start.elapsed().as_secs_f64()
        )
        .green()
        .bold()
    );
    println!();

    Ok(())
}

/// Run `cargo` with `args` and capture its output.
pub fn cargo(args: &[&str]) -> Result<Output> {
    Command::new("cargo")
        .args(args)
        .output()
        .context("Failed to spawn cargo")
}

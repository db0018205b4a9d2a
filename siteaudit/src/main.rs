use clap::ArgMatches;
use colored::Colorize;
use commands::command_argument_builder;
use indicatif::{ProgressBar, ProgressStyle};
use siteaudit::handlers::{render_report, resolve_output_path, summary_line};
use siteaudit_core::audit::{AuditOptions, execute_audit};
use siteaudit_core::print_banner;
use siteaudit_core::report::{ReportFormat, save_report};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

mod commands;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    match chosen_command.subcommand() {
        Some(("run", primary_command)) => handle_run(primary_command, quiet).await,
        None => {}
        _ => unreachable!("clap should ensure we don't get here"),
    }
}

async fn handle_run(sub_matches: &ArgMatches, quiet: bool) {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    let seed_url = sub_matches.get_one::<String>("SEED_URL").unwrap().clone();
    let max_depth = *sub_matches.get_one::<i64>("MAX_DEPTH").unwrap();
    let workers = *sub_matches.get_one::<usize>("threads").unwrap();
    let timeout = *sub_matches.get_one::<u64>("timeout").unwrap();
    let rps = *sub_matches.get_one::<f64>("rps").unwrap();
    let max_pages = sub_matches.get_one::<usize>("max-pages").copied();
    let budget = sub_matches.get_one::<u64>("budget").copied();
    let output = sub_matches.get_one::<String>("output");
    let format = sub_matches
        .get_one::<String>("format")
        .and_then(|f| ReportFormat::from_str(f))
        .unwrap_or(ReportFormat::Text);

    // Set up the progress spinner unless quiet
    let progress_bar = if quiet {
        None
    } else {
        let pb = ProgressBar::new_spinner();
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.cyan} {msg}")
                .unwrap(),
        );
        pb.enable_steady_tick(Duration::from_millis(100));
        pb.set_message("Starting audit...");
        Some(Arc::new(pb))
    };

    let processed_count = Arc::new(AtomicUsize::new(0));
    let progress_callback = progress_bar.as_ref().map(|pb| {
        let pb = pb.clone();
        let count = processed_count.clone();
        Arc::new(move |_worker_id: usize, url: String| {
            let n = count.fetch_add(1, Ordering::Relaxed) + 1;
            pb.set_message(format!("Auditing... {} pages ({})", n, url));
        }) as siteaudit_core::audit::AuditProgressCallback
    });

    let options = AuditOptions {
        seed_url,
        max_depth,
        workers,
        timeout: Duration::from_secs(timeout),
        requests_per_second: rps,
        max_pages,
        time_budget: budget.map(Duration::from_secs),
    };

    match execute_audit(options, progress_callback, None).await {
        Ok(report) => {
            if let Some(ref pb) = progress_bar {
                pb.finish_and_clear();
            }

            let rendered = match render_report(&report, &format) {
                Ok(rendered) => rendered,
                Err(e) => {
                    eprintln!("{} {}", "✗".red().bold(), e);
                    std::process::exit(1);
                }
            };

            if let Some(output) = output {
                let path = resolve_output_path(output);
                if let Err(e) = save_report(&rendered, &path) {
                    eprintln!(
                        "{} Failed to write report to {}: {}",
                        "✗".red().bold(),
                        path.display(),
                        e
                    );
                    std::process::exit(1);
                }
                println!(
                    "{} Report saved to {}",
                    "✓".green().bold(),
                    path.display().to_string().bright_white()
                );
            } else {
                print!("{}", rendered);
            }

            println!("{} {}", "✓".green().bold(), summary_line(&report));
        }
        Err(e) => {
            if let Some(ref pb) = progress_bar {
                pb.finish_and_clear();
            }
            eprintln!("{} Audit failed: {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

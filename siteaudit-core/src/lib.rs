pub mod analysis;
pub mod audit;
pub mod report;

pub use analysis::{Rule, RuleError, RuleSet};
pub use audit::{AuditOptions, AuditProgressCallback, AuditRecordCallback, execute_audit};
pub use report::{Report, ReportBuilder, ReportFormat, Summary};

pub fn print_banner() {
    use colored::Colorize;

    let banner = r#"
     _ _                        _ _ _
 ___(_) |_ ___  __ _ _   _  __| (_) |_
/ __| | __/ _ \/ _` | | | |/ _` | | __|
\__ \ | ||  __/ (_| | |_| | (_| | | |_
|___/_|\__\___|\__,_|\__,_|\__,_|_|\__|
"#;
    println!("{}", banner.bright_cyan());
    println!(
        "{}\n",
        " bounded-depth site crawler and content auditor".bright_white()
    );
}

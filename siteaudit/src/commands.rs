use crate::CLAP_STYLING;
use clap::{arg, command};

pub(crate) fn command_argument_builder() -> clap::Command {
    clap::Command::new("siteaudit")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("siteaudit")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .subcommand_required(false)
        .subcommand(
            command!("run")
                .about(
                    "Crawl a site breadth-first from the seed URL and run the content \
                quality checks against every page.",
                )
                // A negative MAX_DEPTH must reach the validation layer, not
                // die in argument parsing.
                .allow_negative_numbers(true)
                .arg(
                    arg!([SEED_URL])
                        .required(true)
                        .help("Absolute URL to start crawling from"),
                )
                .arg(
                    arg!([MAX_DEPTH])
                        .required(false)
                        .help("Maximum link depth from the seed (0 audits only the seed page)")
                        .value_parser(clap::value_parser!(i64))
                        .default_value("1"),
                )
                .arg(
                    arg!(-t --"threads" <NUM_WORKERS>)
                        .required(false)
                        .help("The number of async worker 'threads' in the worker pool.")
                        .value_parser(clap::value_parser!(usize))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"timeout" <SECONDS>)
                        .required(false)
                        .help("Per-request timeout in seconds")
                        .value_parser(clap::value_parser!(u64))
                        .default_value("10"),
                )
                .arg(
                    arg!(--"max-pages" <COUNT>)
                        .required(false)
                        .help("Stop after this many pages have been fetched")
                        .value_parser(clap::value_parser!(usize)),
                )
                .arg(
                    arg!(--"budget" <SECONDS>)
                        .required(false)
                        .help("Overall time budget for the run; in-flight fetches finish normally")
                        .value_parser(clap::value_parser!(u64)),
                )
                .arg(
                    arg!(--"rps" <RATE>)
                        .required(false)
                        .help("Per-host request ceiling in requests per second")
                        .value_parser(clap::value_parser!(f64))
                        .default_value("2.0"),
                )
                .arg(
                    arg!(-o --"output" <PATH>)
                        .required(false)
                        .help("Save report to file (default: display to screen)"),
                )
                .arg(
                    arg!(-f --"format" <FORMAT>)
                        .required(false)
                        .help("Report format: text, json")
                        .value_parser(["text", "json"])
                        .default_value("text"),
                ),
        )
}

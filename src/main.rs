use clap::{Parser, Subcommand};

mod export;
mod lines;
mod repair;
mod report;
mod rules;
mod schema;

pub type Result<T> = anyhow::Result<T>;

#[derive(Parser)]
#[command(name = "setlog-repair")]
#[command(about = "Repair and validate exercise-set records from a chat export", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Repair every message, validate recovered records, write a discard report.
    Recover {
        #[arg(long)]
        export: String,

        /// Where to write the discard report (JSON).
        #[arg(short = 'o', long)]
        out: String,

        /// Optionally write accepted records as a JSON array.
        #[arg(long)]
        accepted_out: Option<String>,
    },
    /// Count which syntactic rules the messages break (no repair).
    Classify {
        #[arg(long)]
        export: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.cmd {
        Commands::Recover {
            export,
            out,
            accepted_out,
        } => {
            let messages = export::parse_export_file(&export)?;

            let run = report::build_run(&messages)?;
            let t = &run.report.totals;
            println!(
                "accepted {} of {} messages ({} schema-rejected, {} parse-failed, {} unreadable)",
                t.accepted, t.messages, t.schema_rejected, t.parse_failed, t.unreadable
            );

            std::fs::write(&out, serde_json::to_string_pretty(&run.report)?)?;
            println!("Wrote {}", out);

            if let Some(path) = accepted_out {
                std::fs::write(&path, serde_json::to_string_pretty(&run.accepted)?)?;
                println!("Wrote {}", path);
            }
        }
        Commands::Classify { export } => {
            let messages = export::parse_export_file(&export)?;
            let counts = report::rule_histogram(&messages);
            println!("checked {} messages", messages.len());
            for (rule, count) in counts {
                println!("{}: {}", rule, count);
            }
        }
    }

    Ok(())
}

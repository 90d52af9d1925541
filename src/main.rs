mod pipelines;
mod utils;
mod config;
mod cli;

use std::io::Write;
use std::sync::Arc;
use std::time::Instant;
use std::{env, fs};

use anyhow::Result;
use env_logger::Builder;
use log::{LevelFilter, debug, error};

use crate::cli::parse;
use crate::config::defs::{PipelineError, RunConfig};
use crate::config::params::ParameterStore;
use crate::pipelines::otu_table;
use crate::utils::exec::{ExecutionPolicy, Parallel, PrintOnly, Serial};
use crate::utils::file::absolute_path;
use crate::utils::status::{SilentStatus, StatusReporter, VerboseStatus};

#[tokio::main]
async fn main() -> Result<()> {
    let run_start = Instant::now();

    let args = parse();

    let log_level = if args.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };

    Builder::new()
        .filter_level(log_level)
        .format(|buf, record| {
            writeln!(
                buf,
                "[{}] {}: {}",
                chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                record.level(),
                record.args()
            )
        })
        .init();

    println!("\n-------------\n OTU Pipelines\n-------------\n");

    let cwd = env::current_dir()?;
    debug!("The current directory is {:?}", cwd);

    let parameter_fp = absolute_path(&args.parameter_fp, &cwd);
    let parameter_contents = match fs::read_to_string(&parameter_fp) {
        Ok(contents) => contents,
        Err(e) => {
            error!(
                "Can't open parameter file {}: {}. Does it exist? Do you have read access?",
                parameter_fp.display(),
                e
            );
            std::process::exit(1);
        }
    };
    let params = match ParameterStore::parse(&parameter_contents) {
        Ok(params) => params,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if args.sff_fp.is_some() != args.mapping_fp.is_some() {
        error!("{}", PipelineError::InconsistentDenoiseInputs);
        std::process::exit(1);
    }

    let input_fp = absolute_path(&args.input_fp, &cwd);
    let out_dir = absolute_path(&args.output_dir, &cwd);
    let sff_fp = args.sff_fp.as_ref().map(|p| absolute_path(p, &cwd));
    let mapping_fp = args.mapping_fp.as_ref().map(|p| absolute_path(p, &cwd));

    let policy: Box<dyn ExecutionPolicy> = if args.print_only {
        Box::new(PrintOnly)
    } else if args.parallel {
        Box::new(Parallel)
    } else {
        Box::new(Serial)
    };

    let reporter: Box<dyn StatusReporter> = if args.verbose {
        Box::new(VerboseStatus)
    } else {
        Box::new(SilentStatus)
    };

    let run_config = Arc::new(RunConfig {
        cwd,
        input_fp,
        out_dir,
        sff_fp,
        mapping_fp,
        params,
        args,
    });

    if let Err(e) = otu_table::run(run_config, policy.as_ref(), reporter.as_ref()).await {
        error!("Pipeline failed: {} at {} milliseconds.", e, run_start.elapsed().as_millis());
        std::process::exit(1);
    }

    println!("Run complete: {} milliseconds.", run_start.elapsed().as_millis());
    Ok(())
}

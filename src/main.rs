use catalog_harvest::cli::CliArgs;
use catalog_harvest::core::processor;
use catalog_harvest::error::{AppError, AppResult};
use catalog_harvest::logging::{log, setup_logging, LogLevel};
use catalog_harvest::testing;
use clap::{CommandFactory, Parser};
use std::process::ExitCode;
use tokio::runtime::Builder;

fn main() -> ExitCode {
    setup_logging();

    let cli_args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) if !e.use_stderr() => {
            // --help / --version
            let _ = e.print();
            return ExitCode::SUCCESS;
        }
        Err(e) => {
            log(LogLevel::Error, &format!("CLI Argument Error: {}", e));
            let _ = CliArgs::command().print_help();
            return ExitCode::from(2);
        }
    };

    let cfg = match cli_args.to_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            log(LogLevel::Error, &e.to_string());
            return ExitCode::from(2);
        }
    };

    let runtime = match Builder::new_multi_thread()
        .enable_all()
        .thread_name("crawl-worker")
        .worker_threads(num_cpus::get())
        .build()
    {
        Ok(rt) => rt,
        Err(e) => {
            log(
                LogLevel::Error,
                &format!("FATAL: Failed to build Tokio runtime: {}", e),
            );
            return ExitCode::FAILURE;
        }
    };

    let main_result: AppResult<i32> = runtime.block_on(async {
        if let Some(test_file_path) = cli_args.get_test_detail_file() {
            if !test_file_path.exists() {
                log(
                    LogLevel::Error,
                    &format!("Test input file not found: {}", test_file_path.display()),
                );
                return Err(AppError::Argument("Test input file not found.".to_string()));
            }

            let output_path = cli_args.get_test_output_file();
            match testing::test_detail_transform(&cfg, &test_file_path, &output_path).await {
                Ok(()) => Ok(0),
                Err(e) => {
                    log(LogLevel::Error, &format!("Test mode failed: {}", e));
                    Ok(1)
                }
            }
        } else {
            processor::run(cfg).await
        }
    });

    match main_result {
        Ok(exit_code) => ExitCode::from(u8::try_from(exit_code).unwrap_or(1)),
        Err(AppError::Argument(_)) => ExitCode::from(2),
        Err(e) => {
            log(LogLevel::Error, &format!("FATAL UNEXPECTED ERROR: {}", e));
            ExitCode::FAILURE
        }
    }
}

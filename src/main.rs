use std::fs;
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;

mod cli;

use cli::Cli;
use cli::commands::Commands;
use rubric::eval::{PlanSolveEvaluator, PlanSolveReport, PromptEvaluator};
use rubric::llm::{CompletionResult, LlmClient, LlmConfig, OpenAiClient};
use rubric::reflect::{LoopOutcome, ReflectionAgent};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("rubric")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("rubric.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

/// Use the prompt argument when given, otherwise ask on stdin.
fn read_prompt(arg: Option<String>, heading: &str) -> Result<String> {
    if let Some(prompt) = arg {
        return Ok(prompt.trim().to_string());
    }

    println!("{}", heading.cyan());
    print!("> ");
    std::io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read prompt from stdin")?;
    Ok(line.trim().to_string())
}

fn print_call_error(result: &CompletionResult) {
    let kind = result
        .error_kind
        .map(|k| k.as_str())
        .unwrap_or("unknown_error");
    println!("{} {} - {}", "Error:".red(), kind, result.error_message);
}

async fn run_evaluate(client: Arc<dyn LlmClient>, prompt: Option<String>) -> Result<()> {
    let prompt = read_prompt(prompt, "Enter a prompt to evaluate:")?;
    info!("Running single-shot evaluation");

    let evaluator = PromptEvaluator::new(client);
    let result = evaluator.evaluate_result(&prompt).await;

    println!("\n{}", "Evaluation Result:".green());
    if result.ok {
        println!("{}", result.content);
    } else {
        print_call_error(&result);
    }
    Ok(())
}

fn print_plan_solve_report(report: &PlanSolveReport) -> Result<()> {
    if !report.ok {
        println!("\n{}", "Plan-and-Solve failed:".red());
        let kind = report
            .error_kind
            .map(|k| k.as_str())
            .unwrap_or("unknown_error");
        println!("{} {} - {}", "Error:".red(), kind, report.error_message);
        if !report.errors.is_empty() {
            println!("Error details:");
            for error in &report.errors {
                println!("{}", serde_json::to_string(error)?);
            }
        }
        return Ok(());
    }

    println!("\n{}", "Plan:".green());
    println!("{}", report.plan);
    println!("\n{}", "Step Analyses:".green());
    println!("{}", report.step_analyses);
    println!("\n{}", "Final Evaluation (Raw):".green());
    println!("{}", report.final_raw);
    println!("\n{}", "Final Evaluation (JSON parsed):".green());
    println!("{}", serde_json::to_string_pretty(&report.final_json)?);
    Ok(())
}

async fn run_plan_solve(client: Arc<dyn LlmClient>, prompt: Option<String>) -> Result<()> {
    let prompt = read_prompt(prompt, "Enter a prompt to evaluate with Plan-and-Solve:")?;
    info!("Running plan-and-solve evaluation");

    let evaluator = PlanSolveEvaluator::new(client);
    let report = evaluator.evaluate(&prompt).await;
    print_plan_solve_report(&report)
}

fn print_loop_outcome(outcome: &LoopOutcome) -> Result<()> {
    if !outcome.ok {
        println!("\n{}", "Reflection run failed:".red());
        let kind = outcome
            .error_kind
            .map(|k| k.as_str())
            .unwrap_or("unknown_error");
        println!("{} {} - {}", "Error:".red(), kind, outcome.error_message);
    }

    println!("\n{} {}", "Iterations:".green(), outcome.iterations);
    println!("\n{}", "Final Prompt:".green());
    println!("{}", outcome.final_prompt);
    println!("\n{}", "Final Feedback:".green());
    println!("{}", outcome.final_feedback);
    println!("\n{}", "Final Evaluation (Raw):".green());
    println!("{}", outcome.final_evaluation_raw);
    println!("\n{}", "Final Evaluation (JSON parsed):".green());
    println!("{}", serde_json::to_string_pretty(&outcome.final_evaluation_json)?);
    Ok(())
}

async fn run_refine(
    client: Arc<dyn LlmClient>,
    prompt: Option<String>,
    max_iterations: u32,
    target_overall: f64,
) -> Result<()> {
    let prompt = read_prompt(prompt, "Enter a prompt to optimize with the Reflection Agent:")?;
    info!(
        "Running reflection loop (max_iterations: {}, target_overall: {})",
        max_iterations, target_overall
    );

    let agent = ReflectionAgent::new(client)
        .with_max_iterations(max_iterations)
        .with_target_overall(target_overall);
    let outcome = agent.run(&prompt).await;
    print_loop_outcome(&outcome)
}

async fn run_application(cli: Cli, client: Arc<dyn LlmClient>) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    match cli.command {
        Commands::Evaluate { prompt } => run_evaluate(client, prompt).await,
        Commands::PlanSolve { prompt } => run_plan_solve(client, prompt).await,
        Commands::Refine {
            prompt,
            max_iterations,
            target_overall,
        } => run_refine(client, prompt, max_iterations, target_overall).await,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // LLM settings come from the environment; validation happens before any call
    let config = LlmConfig::from_env().context("Failed to load LLM configuration")?;
    let client: Arc<dyn LlmClient> = Arc::new(OpenAiClient::new(config)?);

    run_application(cli, client).await.context("Application failed")?;

    Ok(())
}

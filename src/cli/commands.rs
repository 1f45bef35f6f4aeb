//! CLI command definitions using clap.
//!
//! Three modes map onto the three evaluation strategies:
//! - evaluate: single scoring call
//! - plan-solve: plan, per-step analysis, synthesized score
//! - refine: reflection loop with an iteration budget and target score

use clap::{Parser, Subcommand};

/// rubric - prompt quality evaluation and refinement
#[derive(Parser, Debug)]
#[command(name = "rubric")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a prompt with a single evaluation call
    Evaluate {
        /// Prompt to evaluate; read from stdin when omitted
        prompt: Option<String>,
    },

    /// Evaluate a prompt via plan, step analyses, and synthesis
    PlanSolve {
        /// Prompt to evaluate; read from stdin when omitted
        prompt: Option<String>,
    },

    /// Iteratively refine a prompt until it scores well enough
    Refine {
        /// Prompt to refine; read from stdin when omitted
        prompt: Option<String>,

        /// Maximum reflect/refine iterations
        #[arg(long, default_value_t = 3)]
        max_iterations: u32,

        /// Stop once the overall score reaches this value
        #[arg(long, default_value_t = 8.0)]
        target_overall: f64,
    },
}

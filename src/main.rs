use anyhow::Context;
use clap::{Parser, Subcommand};
use dotenv::dotenv;
use std::io::{self, BufRead, Write};
use std::sync::Arc;

use waypoint_rs::waypoint::config::TutorConfig;
use waypoint_rs::waypoint::scenarios::arithmetic::{self, ArithmeticState, Operator};
use waypoint_rs::waypoint::scenarios::calculator::{self, CalculatorState, Symbol};
use waypoint_rs::waypoint::scenarios::compliment::{self, ComplimentState};
use waypoint_rs::waypoint::scenarios::profile::{self, ProfileState};
use waypoint_rs::waypoint::scenarios::tutor::{
    Answer, ProblemSource, RandomProblems, TutorSession,
};
use waypoint_rs::waypoint::workflow::{StepRegistry, WorkflowBuilder};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compliment someone by name
    Compliment {
        #[arg(short, long)]
        name: String,
    },
    /// Sum or multiply a list of numbers
    Calculate {
        #[arg(short, long)]
        name: String,

        /// Comma-separated integers
        #[arg(long, value_delimiter = ',', allow_hyphen_values = true)]
        numbers: Vec<i64>,

        /// '+' or '*'
        #[arg(short, long, default_value = "+")]
        symbol: Symbol,
    },
    /// Build a profile sentence in three steps
    Profile {
        #[arg(short, long)]
        name: String,

        #[arg(short, long)]
        age: u32,

        /// Comma-separated skills
        #[arg(short, long, value_delimiter = ',')]
        skills: Vec<String>,
    },
    /// Route two numbers to addition or subtraction
    Arithmetic {
        #[arg(long, allow_hyphen_values = true)]
        number1: i64,

        #[arg(long, allow_hyphen_values = true)]
        number2: i64,

        /// '+' or '-'
        #[arg(long, allow_hyphen_values = true)]
        operation: Operator,

        /// Second stage as NUMBER3 OPERATION NUMBER4, e.g. `7 + 2`
        #[arg(long, num_args = 3, allow_hyphen_values = true, value_names = ["NUMBER3", "OPERATION", "NUMBER4"])]
        then: Option<Vec<String>>,
    },
    /// Interactive adaptive math quiz
    Tutor {
        /// Student name, asked for when missing
        #[arg(short, long)]
        name: Option<String>,

        /// Seed for reproducible problems
        #[arg(long)]
        seed: Option<u64>,
    },
    /// Run a workflow from a YAML file
    Workflow {
        /// Path to the workflow file
        #[arg(short, long)]
        file: String,

        /// Initial state as a JSON object
        #[arg(short, long, default_value = "{}")]
        input: String,

        /// Print the graph wiring instead of running it
        #[arg(long)]
        structure: bool,
    },
}

fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::Compliment { name } => {
            let state = compliment::graph()?.run(ComplimentState::new(name))?;
            println!("{}", state.message);
        }
        Commands::Calculate {
            name,
            numbers,
            symbol,
        } => {
            let state = calculator::graph()?.run(CalculatorState::new(name, numbers, symbol))?;
            println!("{}", state.result.unwrap_or_default());
        }
        Commands::Profile { name, age, skills } => {
            let state = profile::graph()?.run(ProfileState::new(name, age, skills))?;
            println!("{}", state.result.unwrap_or_default());
        }
        Commands::Arithmetic {
            number1,
            number2,
            operation,
            then,
        } => {
            let mut state = ArithmeticState::single(number1, number2, operation);
            let graph = match then {
                Some(second) => {
                    state.number3 = second[0].parse().context("NUMBER3 must be an integer")?;
                    state.operation2 = second[1].parse().map_err(anyhow::Error::msg)?;
                    state.number4 = second[2].parse().context("NUMBER4 must be an integer")?;
                    arithmetic::graph()?
                }
                None => arithmetic::single_stage_graph()?,
            };

            let state = graph.run(state)?;
            println!("{}", state.result.unwrap_or_default());
            if let Some(final_result) = state.final_result {
                println!("{}", final_result);
            }
        }
        Commands::Tutor { name, seed } => run_tutor(name, seed)?,
        Commands::Workflow {
            file,
            input,
            structure,
        } => {
            let registry = StepRegistry::new();
            arithmetic::register_workflow_steps(&registry);
            log::debug!("Registered steps: {:?}", registry.names());

            let workflow = WorkflowBuilder::new(registry).build_file(&file)?;
            if structure {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&workflow.graph().structure())?
                );
                return Ok(());
            }

            let input: serde_json::Value =
                serde_json::from_str(&input).context("--input must be valid JSON")?;
            println!("Running workflow: {}", workflow.name);
            let state = workflow.run(input)?;
            println!("{}", serde_json::to_string_pretty(&state.to_json())?);
        }
    }

    Ok(())
}

fn run_tutor(name: Option<String>, seed: Option<u64>) -> anyhow::Result<()> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    let name = match name {
        Some(name) => name,
        None => {
            prompt("Please enter your name: ")?;
            lines.next().transpose()?.unwrap_or_default().trim().to_string()
        }
    };

    let config = TutorConfig::from_env()?;
    let source: Arc<dyn ProblemSource> = match seed {
        Some(seed) => Arc::new(RandomProblems::seeded(seed)),
        None => Arc::new(RandomProblems::new()),
    };

    let mut session = TutorSession::start(name, config, source)?;
    println!("{}", session.state().conversation_history.join("\n"));

    while !session.is_finished() {
        prompt("\nYour answer (or type 'hint' for help): ")?;
        let Some(line) = lines.next().transpose()? else {
            break;
        };

        let answer: Answer = match line.parse() {
            Ok(answer) => answer,
            Err(_) => {
                println!("Please enter a valid number or 'hint'");
                continue;
            }
        };

        let seen = session.state().conversation_history.len();
        session.submit(answer)?;
        println!("{}", session.messages_since(seen).join("\n"));
    }

    Ok(())
}

fn prompt(text: &str) -> io::Result<()> {
    print!("{}", text);
    io::stdout().flush()
}

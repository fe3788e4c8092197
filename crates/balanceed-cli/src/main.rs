//! BalancEED CLI
//!
//! Terminal front end for the BalancEED youth-development platform.

use std::io::Write;
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;

use balanceed_client::{
    BrainTraining, ChatRooms, Contact, Dashboard, Donations, Identity, Pathways, StudentLog,
    Survey,
};
use balanceed_core::{
    Answer, AttemptStatus, BalanceedError, Config, ContactForm, DonationForm, Exercise,
    ExerciseKind, ExerciseRunner, JournalEntry, LifeSkillTask, NewChatRoom, NutritionLog,
    RegistrationWizard, Step, SurveyQuestion, User,
};
use clap::{Parser, Subcommand};
use tokio::io::{stdin, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::mpsc;
use tracing_subscriber::EnvFilter;

/// How often the chat view checks for new messages.
const CHAT_REFRESH: Duration = Duration::from_millis(500);

/// BalancEED - learning, training and community for young people
#[derive(Parser, Debug)]
#[command(name = "balanceed")]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to configuration file (default: balanceed.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Override the API base URL
    #[arg(long, value_name = "URL", global = true)]
    api_url: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in with email and password
    Login {
        /// Account email
        email: String,
        /// Account password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account with the registration wizard
    Register,
    /// Sign out and forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Reset the demo data and sign in as the demo student
    Demo,
    /// Show the student dashboard
    Dashboard,
    /// List brain-training exercises
    Exercises,
    /// Run a timed brain-training exercise
    Train {
        /// Exercise id
        id: String,
    },
    /// Show brain-training progress
    Progress,
    /// List trade pathways, or the modules of one pathway
    Pathways {
        /// Pathway id
        id: Option<String>,
    },
    /// List chat rooms
    Rooms,
    /// Create a chat room
    CreateRoom,
    /// Join a chat room and talk
    Chat {
        /// Room id
        room_id: String,
    },
    /// Write a journal entry
    Journal,
    /// Log a meal
    Nutrition,
    /// Add a life-skill task
    LifeSkill,
    /// Mark a life-skill task as complete
    CompleteSkill {
        /// Task id
        id: String,
    },
    /// Make a donation
    Donate,
    /// Send a message to the team
    Contact,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if args.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            if let Some(hint) = session_hint(&e) {
                eprintln!("\nSuggestion: {hint}");
            }
            ExitCode::from(1)
        }
    }
}

/// Extra advice for errors caused by a missing or expired credential.
fn session_hint(err: &anyhow::Error) -> Option<&'static str> {
    err.downcast_ref::<BalanceedError>()
        .filter(|e| e.is_unauthorized())
        .map(|_| "Run `balanceed login` or `balanceed demo` to sign in again")
}

/// Dispatches one subcommand.
async fn run(args: Args) -> anyhow::Result<()> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(url) = args.api_url {
        config.api_base_url = url;
        config.validate()?;
    }
    tracing::debug!(api = %config.api_base(), session_dir = %config.session_dir, "Configuration loaded");

    let mut identity = Identity::from_config(&config)?;
    let mut input = Prompt::new();

    match args.command {
        Command::Login { email, password } => {
            let password = match password {
                Some(p) => p,
                None => input.ask("Password").await?,
            };
            let user = identity.login(&email, &password).await?;
            print_welcome(&user);
        }
        Command::Register => register(&mut identity, &config, &mut input).await?,
        Command::Logout => {
            identity.logout()?;
            println!("Signed out.");
        }
        Command::Whoami => match identity.user() {
            Some(user) => println!("{} <{}> ({})", user.name, user.email, user.role),
            None => println!("Not signed in."),
        },
        Command::Demo => {
            let user = identity.setup_demo().await?;
            print_welcome(&user);
        }
        Command::Dashboard => {
            require_session(&identity)?;
            show_dashboard(&identity).await;
        }
        Command::Exercises => {
            require_session(&identity)?;
            for exercise in BrainTraining::new(identity.api()).exercises().await? {
                println!(
                    "{:<12} {:<28} {:<8} {:>3} questions  {:>4}s  {:>3} pts",
                    exercise.id,
                    exercise.title,
                    exercise.category,
                    exercise.question_count(),
                    exercise.time_limit,
                    exercise.points
                );
            }
        }
        Command::Train { id } => {
            require_session(&identity)?;
            let training = BrainTraining::new(identity.api());
            let Some(exercise) = training.exercise(&id).await? else {
                anyhow::bail!(
                    "Exercise '{id}' not found\n\nSuggestion: Run `balanceed exercises` to list available exercises"
                );
            };
            if let Some(result) = train(exercise, &mut input).await? {
                training.submit_result(&result).await?;
                println!("Result saved.");
            }
        }
        Command::Progress => {
            require_session(&identity)?;
            let progress = BrainTraining::new(identity.api()).progress().await;
            println!("Exercises completed: {}", progress.total_exercises);
            println!("Average score:       {:.1}%", progress.average_score);
            println!("Points:              {}", progress.total_points);
            for (category, score) in &progress.by_category {
                println!("  {category:<10} {score:.1}%");
            }
        }
        Command::Pathways { id } => {
            require_session(&identity)?;
            let pathways = Pathways::new(identity.api());
            match id {
                Some(id) => {
                    for module in pathways.modules(&id).await? {
                        let minutes = module
                            .duration_minutes
                            .map(|m| format!(" ({m} min)"))
                            .unwrap_or_default();
                        println!("{:>2}. {}{minutes}", module.order, module.title);
                    }
                }
                None => {
                    for pathway in pathways.list().await? {
                        println!("{:<12} {:<24} {}", pathway.id, pathway.name, pathway.description);
                    }
                }
            }
        }
        Command::Rooms => {
            require_session(&identity)?;
            for room in ChatRooms::new(identity.api()).list().await? {
                let full = if room.is_full() { " [full]" } else { "" };
                println!(
                    "{:<12} {:<24} {}/{} {}{full}",
                    room.id,
                    room.name,
                    room.participants.len(),
                    room.max_participants,
                    room.topic
                );
            }
        }
        Command::CreateRoom => {
            require_session(&identity)?;
            let room = NewChatRoom {
                name: input.ask("Room name").await?,
                topic: input.ask("Topic").await?,
                category: input.ask("Category").await?,
                max_participants: input.ask("Max participants").await?.parse().unwrap_or(50),
            };
            let room = ChatRooms::new(identity.api()).create(&room).await?;
            println!("Created room {} ({})", room.name, room.id);
        }
        Command::Chat { room_id } => {
            let session = require_session(&identity)?.clone();
            let channel = ChatRooms::new(identity.api())
                .enter(&config, &session, &room_id)
                .await?;
            chat(channel, &mut input).await?;
        }
        Command::Journal => {
            require_session(&identity)?;
            let entry = JournalEntry {
                mood_rating: input.ask("Mood (1-10)").await?.parse().unwrap_or(0),
                content: input.ask("Entry").await?,
                tags: split_list(&input.ask("Tags (comma separated)").await?),
            };
            StudentLog::new(identity.api()).journal(&entry).await?;
            println!("Journal entry saved.");
        }
        Command::Nutrition => {
            require_session(&identity)?;
            let log = NutritionLog {
                meal_type: input.ask("Meal (breakfast/lunch/dinner/snack)").await?,
                foods: split_list(&input.ask("Foods (comma separated)").await?),
                calories: input.ask("Calories (optional)").await?.parse().ok(),
                notes: input.ask("Notes (optional)").await?,
            };
            StudentLog::new(identity.api()).nutrition(&log).await?;
            println!("Meal logged.");
        }
        Command::LifeSkill => {
            require_session(&identity)?;
            let task = LifeSkillTask {
                skill_category: input.ask("Category").await?,
                task_name: input.ask("Task").await?,
                description: input.ask("Description (optional)").await?,
                notes: String::new(),
            };
            StudentLog::new(identity.api()).life_skill(&task).await?;
            println!("Life skill added.");
        }
        Command::CompleteSkill { id } => {
            require_session(&identity)?;
            StudentLog::new(identity.api()).complete_life_skill(&id).await?;
            println!("Marked {id} complete.");
        }
        Command::Donate => {
            let form = DonationForm {
                name: input.ask("Name").await?,
                email: input.ask("Email").await?,
                amount_cents: parse_amount(&input.ask("Amount (USD)").await?).unwrap_or(0),
                recurring: input.ask("Monthly? (y/N)").await?.eq_ignore_ascii_case("y"),
                message: input.ask("Message (optional)").await?,
            };
            Donations::new(identity.api()).donate(&form).await?;
            println!("Thank you for your donation!");
        }
        Command::Contact => {
            let form = ContactForm {
                name: input.ask("Name").await?,
                email: input.ask("Email").await?,
                subject: input.ask("Subject").await?,
                message: input.ask("Message").await?,
            };
            Contact::new(identity.api()).send(&form).await?;
            println!("Message sent. We'll be in touch.");
        }
    }

    Ok(())
}

// ============================================================================
// Setup helpers
// ============================================================================

/// Loads configuration from the given path or the current directory.
fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

/// Fails unless a session exists.
fn require_session(identity: &Identity) -> anyhow::Result<&balanceed_client::Session> {
    identity.current().ok_or_else(|| {
        anyhow::anyhow!(
            "Not signed in\n\nSuggestion: Run `balanceed login <email>` or `balanceed demo` first"
        )
    })
}

fn print_welcome(user: &User) {
    println!("Welcome, {}! Signed in as {} ({}).", user.name, user.email, user.role);
}

/// Splits a comma-separated list, dropping blanks.
fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Parses a dollar amount such as `25` or `25.50` into cents.
fn parse_amount(input: &str) -> Option<u64> {
    let input = input.trim().trim_start_matches('$');
    let (dollars, cents) = input.split_once('.').unwrap_or((input, "0"));
    let dollars: u64 = dollars.parse().ok()?;
    let cents: u64 = match cents.len() {
        1 => cents.parse::<u64>().ok()? * 10,
        2 => cents.parse().ok()?,
        _ => return None,
    };
    dollars.checked_mul(100)?.checked_add(cents)
}

// ============================================================================
// Terminal input
// ============================================================================

/// Line-based prompts on stdin.
struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self {
            lines: BufReader::new(stdin()).lines(),
        }
    }

    /// Prints `label` and reads one trimmed line.
    async fn ask(&mut self, label: &str) -> anyhow::Result<String> {
        print!("{label}: ");
        std::io::stdout().flush()?;
        self.line().await?.ok_or_else(|| anyhow::anyhow!("Input closed"))
    }

    /// Reads one trimmed line, `None` at end of input.
    async fn line(&mut self) -> anyhow::Result<Option<String>> {
        Ok(self.lines.next_line().await?.map(|l| l.trim().to_string()))
    }
}

// ============================================================================
// Views
// ============================================================================

async fn show_dashboard(identity: &Identity) {
    let data = Dashboard::new(identity.api()).load().await;

    if let Some(user) = data.user.as_ref().or_else(|| identity.user()) {
        println!("Hello, {}!", user.name);
    }
    for (name, value) in &data.stats {
        println!("  {:<28} {value}", name.replace('_', " "));
    }
    println!("Recent progress entries: {}", data.recent_progress.len());
    println!("Recent journal entries:  {}", data.recent_journals.len());
    println!("Recent meals logged:     {}", data.recent_nutrition.len());
    if !data.life_skills.is_empty() {
        println!("Life skills:");
        for skill in &data.life_skills {
            let mark = if skill.completed { "x" } else { " " };
            println!("  [{mark}] {} ({})", skill.task_name, skill.id);
        }
    }
}

fn show_question(exercise: &Exercise, index: usize, time_remaining: u32) {
    let Some(prompt) = exercise.prompt(index) else {
        return;
    };
    println!();
    println!(
        "Question {}/{} [{time_remaining}s left]",
        index + 1,
        exercise.question_count()
    );
    println!("  {prompt}");
    if let Some(options) = exercise.options(index) {
        for (i, option) in options.iter().enumerate() {
            println!("    {}. {option}", i + 1);
        }
    }
}

/// Maps terminal input to an answer; options are numbered from 1 on screen.
fn read_answer(kind: ExerciseKind, input: &str) -> Answer {
    match kind {
        ExerciseKind::MultipleChoice => input
            .trim()
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .map_or_else(|| Answer::Text(input.trim().to_string()), Answer::Choice),
        ExerciseKind::Calculation => Answer::from_input(kind, input),
    }
}

/// Runs one exercise interactively. Returns `None` if input ended first.
async fn train(
    exercise: Exercise,
    input: &mut Prompt,
) -> anyhow::Result<Option<balanceed_core::ExerciseResult>> {
    println!("{} ({}s, {} points)", exercise.title, exercise.time_limit, exercise.points);
    if let Some(description) = &exercise.description {
        println!("{description}");
    }

    let kind = exercise.kind();
    let runner = ExerciseRunner::new(exercise.clone());
    let mut snapshots = runner.subscribe();
    let (answers, rx) = mpsc::channel(1);
    let run = tokio::spawn(runner.run(rx, |result| {
        println!();
        println!("Finished: {result}");
        if result.is_perfect() {
            println!("Perfect score!");
        }
    }));

    let mut shown = usize::MAX;
    loop {
        let snapshot = *snapshots.borrow_and_update();
        if snapshot.status == AttemptStatus::Completed {
            break;
        }
        if snapshot.question_index != shown {
            shown = snapshot.question_index;
            show_question(&exercise, shown, snapshot.time_remaining);
            print!("> ");
            std::io::stdout().flush()?;
        }

        tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            line = input.line() => {
                match line? {
                    Some(line) => {
                        if answers.send(read_answer(kind, &line)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    drop(answers);
    Ok(run.await?)
}

/// Interactive chat until `/leave` or end of input.
async fn chat(
    mut channel: balanceed_client::RoomChannel,
    input: &mut Prompt,
) -> anyhow::Result<()> {
    println!("Joined {}. Type a message, or /leave to exit.", channel.room_id());

    let mut printed = 0;
    let mut refresh = tokio::time::interval(CHAT_REFRESH);
    loop {
        tokio::select! {
            _ = refresh.tick() => {
                let messages = channel.log().snapshot().await;
                for message in messages.iter().skip(printed) {
                    println!("{}: {}", message.username, message.message);
                }
                printed = messages.len();
            }
            line = input.line() => {
                match line? {
                    Some(line) if line == "/leave" => break,
                    Some(line) => {
                        channel.send(&line).await?;
                    }
                    None => break,
                }
            }
        }
    }

    channel.leave().await;
    Ok(())
}

// ============================================================================
// Registration
// ============================================================================

async fn register(
    identity: &mut Identity,
    config: &Config,
    input: &mut Prompt,
) -> anyhow::Result<()> {
    let questions = Survey::new(identity.api(), config.survey_timeout())
        .questions()
        .await;
    let mut wizard = RegistrationWizard::new(questions);

    loop {
        let step = wizard.step();
        println!();
        println!("Step {}/{}: {step}", step.index() + 1, Step::ALL.len());

        match step {
            Step::Account => {
                let profile = wizard.profile_mut();
                profile.name = input.ask("Full name").await?;
                profile.email = input.ask("Email").await?;
                profile.password = input.ask("Password").await?;
            }
            Step::Profile => {
                let role = input.ask("Role (student/mentor) [student]").await?;
                let institution = input.ask("Institution id (optional)").await?;
                let age = input.ask("Age (optional)").await?;
                let profile = wizard.profile_mut();
                if !role.is_empty() {
                    profile.role = role;
                }
                profile.institution_id = (!institution.is_empty()).then_some(institution);
                profile.age = age.parse().ok();
            }
            Step::Interests | Step::Goals => {
                let step_questions: Vec<SurveyQuestion> =
                    wizard.questions_for(step).cloned().collect();
                for question in &step_questions {
                    ask_survey_question(&mut wizard, question, input).await?;
                }
            }
            Step::Review => {
                let profile = wizard.profile();
                println!("  Name:  {}", profile.name);
                println!("  Email: {}", profile.email);
                println!("  Role:  {}", profile.role);
                println!("  Survey answers: {}", wizard.answers().len());

                let choice = input.ask("Create account? (y = yes, b = back)").await?;
                if choice.eq_ignore_ascii_case("b") {
                    wizard.back()?;
                    continue;
                }
                if !choice.eq_ignore_ascii_case("y") {
                    println!("Registration cancelled.");
                    return Ok(());
                }
                let profile = wizard.finish()?;
                let user = identity.register(&profile).await?;
                print_welcome(&user);
                return Ok(());
            }
        }

        if let Err(e) = wizard.next() {
            println!("{e}");
        }
    }
}

/// Asks one survey question until it gets a valid answer or is skipped.
async fn ask_survey_question(
    wizard: &mut RegistrationWizard,
    question: &SurveyQuestion,
    input: &mut Prompt,
) -> anyhow::Result<()> {
    use balanceed_core::QuestionKind;

    println!("{}", question.question);
    match &question.kind {
        QuestionKind::Select { options } | QuestionKind::MultiSelect { options } => {
            for (i, option) in options.iter().enumerate() {
                println!("  {}. {option}", i + 1);
            }
        }
        QuestionKind::Scale {
            min,
            max,
            min_label,
            max_label,
        } => {
            println!(
                "  {min} = {}, {max} = {}",
                min_label.as_deref().unwrap_or("low"),
                max_label.as_deref().unwrap_or("high")
            );
        }
    }

    loop {
        let answer = input.ask("Answer").await?;
        if answer.is_empty() && !question.required {
            return Ok(());
        }
        match question
            .parse_input(&answer)
            .and_then(|parsed| wizard.set_answer(&question.id, parsed))
        {
            Ok(()) => return Ok(()),
            Err(e) => println!("{e}"),
        }
    }
}

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use course_core::Catalog;
use course_core::access::{LibraryAccess, View, ViewDecision, library_access, requires_premium};
use course_core::grading::{GradingRequest, GradingResult};
use course_core::library::{PromptCategory, PromptLibrary};
use course_core::model::{LessonDefinition, LessonId, LessonProgress, LessonStatus, Week};
use course_core::platform::HostPlatform;
use services::{Clock, LearnerError, LearnerSession, Mentor, MentorService, SubmissionOutcome};
use storage::repository::Storage;

const DEFAULT_DB_URL: &str = "sqlite://prompt-course.sqlite3";

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    MissingArgument { what: &'static str },
    UnknownArg(String),
    UnknownCommand(String),
    UnexpectedFlag { flag: &'static str },
    ConflictingSubmission,
    InvalidLessonId { raw: String },
    InvalidDbUrl { raw: String },
    InvalidHost { raw: String },
    InvalidCategory { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::MissingArgument { what } => write!(f, "missing {what}"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::UnknownCommand(cmd) => write!(f, "unknown subcommand: {cmd}"),
            ArgsError::UnexpectedFlag { flag } => {
                write!(f, "{flag} is not valid for this subcommand")
            }
            ArgsError::ConflictingSubmission => {
                write!(f, "give the submission inline or with --file, not both")
            }
            ArgsError::InvalidLessonId { raw } => write!(f, "invalid lesson id: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidHost { raw } => write!(f, "invalid --host value: {raw}"),
            ArgsError::InvalidCategory { raw } => write!(f, "invalid --category value: {raw}"),
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  app status");
    eprintln!("  app lesson <id>");
    eprintln!("  app submit <id> (<text>... | --file <path>)");
    eprintln!("  app export");
    eprintln!("  app import <code>");
    eprintln!("  app unlock");
    eprintln!("  app certificate [--name <name>]");
    eprintln!("  app practice [--answer <text>]");
    eprintln!("  app library [--category <name>] [--query <text>] [--copy <id>]");
    eprintln!();
    eprintln!("Global options:");
    eprintln!("  --db <sqlite_url>                   default {DEFAULT_DB_URL}");
    eprintln!("  --host standalone|telegram|vk       default standalone");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LEARN_DB_URL, LEARN_HOST, LEARN_AI_API_KEY, LEARN_AI_BASE_URL, LEARN_AI_MODEL,");
    eprintln!("  RUST_LOG");
}

//
// ─── ARGUMENTS ─────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq)]
enum SubmissionSource {
    Inline(String),
    File(PathBuf),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Status,
    Lesson(LessonId),
    Submit {
        lesson_id: LessonId,
        source: SubmissionSource,
    },
    Export,
    Import(String),
    Unlock,
    Certificate {
        name: Option<String>,
    },
    Practice {
        answer: Option<String>,
    },
    Library {
        category: Option<PromptCategory>,
        query: String,
        copy: Option<String>,
    },
}

/// Subcommand flags, collected before the subcommand is known.
#[derive(Debug, Default)]
struct CommandOptions {
    file: Option<PathBuf>,
    answer: Option<String>,
    category: Option<PromptCategory>,
    query: Option<String>,
    copy: Option<String>,
    name: Option<String>,
}

impl CommandOptions {
    fn leftover(&self) -> Option<&'static str> {
        [
            (self.file.is_some(), "--file"),
            (self.answer.is_some(), "--answer"),
            (self.category.is_some(), "--category"),
            (self.query.is_some(), "--query"),
            (self.copy.is_some(), "--copy"),
            (self.name.is_some(), "--name"),
        ]
        .into_iter()
        .find_map(|(set, flag)| set.then_some(flag))
    }
}

impl Command {
    fn from_parts(
        positionals: Vec<String>,
        mut options: CommandOptions,
    ) -> Result<Self, ArgsError> {
        let mut positionals = positionals.into_iter();
        let name = positionals.next();

        let command = match name.as_deref() {
            None | Some("status") => Command::Status,
            Some("lesson") => Command::Lesson(parse_lesson_id(positionals.next())?),
            Some("submit") => {
                let lesson_id = parse_lesson_id(positionals.next())?;
                let words: Vec<String> = positionals.by_ref().collect();
                let source = match (options.file.take(), words.is_empty()) {
                    (Some(path), true) => SubmissionSource::File(path),
                    (None, false) => SubmissionSource::Inline(words.join(" ")),
                    (Some(_), false) => return Err(ArgsError::ConflictingSubmission),
                    (None, true) => {
                        return Err(ArgsError::MissingArgument {
                            what: "submission text",
                        });
                    }
                };
                Command::Submit { lesson_id, source }
            }
            Some("export") => Command::Export,
            Some("import") => Command::Import(
                positionals
                    .next()
                    .ok_or(ArgsError::MissingArgument { what: "sync code" })?,
            ),
            Some("unlock") => Command::Unlock,
            Some("certificate") => Command::Certificate {
                name: options.name.take(),
            },
            Some("practice") => Command::Practice {
                answer: options.answer.take(),
            },
            Some("library") => Command::Library {
                category: options.category.take(),
                query: options.query.take().unwrap_or_default(),
                copy: options.copy.take(),
            },
            Some(other) => return Err(ArgsError::UnknownCommand(other.to_string())),
        };

        if let Some(extra) = positionals.next() {
            return Err(ArgsError::UnknownArg(extra));
        }
        if let Some(flag) = options.leftover() {
            return Err(ArgsError::UnexpectedFlag { flag });
        }
        Ok(command)
    }
}

fn parse_lesson_id(raw: Option<String>) -> Result<LessonId, ArgsError> {
    let raw = raw.ok_or(ArgsError::MissingArgument { what: "lesson id" })?;
    raw.parse().map_err(|_| ArgsError::InvalidLessonId { raw })
}

fn parse_host(raw: String) -> Result<HostPlatform, ArgsError> {
    raw.parse().map_err(|_| ArgsError::InvalidHost { raw })
}

#[derive(Debug)]
struct Args {
    db_url: String,
    host: HostPlatform,
    command: Command,
}

impl Args {
    fn from_env_and_args(args: impl IntoIterator<Item = String>) -> Result<Self, ArgsError> {
        let db_url = std::env::var("LEARN_DB_URL").ok();
        let host = std::env::var("LEARN_HOST").ok();
        Self::parse(db_url, host, args)
    }

    fn parse(
        env_db_url: Option<String>,
        env_host: Option<String>,
        args: impl IntoIterator<Item = String>,
    ) -> Result<Self, ArgsError> {
        let mut db_url = env_db_url
            .filter(|value| !value.trim().is_empty())
            .map_or_else(|| DEFAULT_DB_URL.to_string(), |value| normalize_sqlite_url(&value));
        let mut host = env_host
            .filter(|value| !value.trim().is_empty())
            .map(parse_host)
            .transpose()?
            .unwrap_or_default();

        let mut positionals = Vec::new();
        let mut options = CommandOptions::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = normalize_sqlite_url(&value);
                }
                "--host" => host = parse_host(require_value(&mut args, "--host")?)?,
                "--file" => options.file = Some(require_value(&mut args, "--file")?.into()),
                "--answer" => options.answer = Some(require_value(&mut args, "--answer")?),
                "--query" => options.query = Some(require_value(&mut args, "--query")?),
                "--copy" => options.copy = Some(require_value(&mut args, "--copy")?),
                "--name" => options.name = Some(require_value(&mut args, "--name")?),
                "--category" => {
                    let value = require_value(&mut args, "--category")?;
                    let category = value
                        .parse()
                        .map_err(|_| ArgsError::InvalidCategory { raw: value.clone() })?;
                    options.category = Some(category);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ if arg.starts_with("--") => return Err(ArgsError::UnknownArg(arg)),
                _ => positionals.push(arg),
            }
        }

        Ok(Self {
            db_url,
            host,
            command: Command::from_parts(positionals, options)?,
        })
    }
}

fn normalize_sqlite_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed == "sqlite::memory:" || trimmed.starts_with("sqlite://") {
        return trimmed.to_string();
    }

    let path = Path::new(trimmed.strip_prefix("sqlite:").unwrap_or(trimmed));
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// The pool creates the database file on connect; only its directory has to
/// exist beforehand.
fn ensure_database_dir(db_url: &str) -> std::io::Result<()> {
    let Some(path) = db_url.strip_prefix("sqlite://") else {
        return Ok(());
    };
    let path = Path::new(path.split('?').next().unwrap_or(path));
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => std::fs::create_dir_all(parent),
        _ => Ok(()),
    }
}

//
// ─── COMMANDS ──────────────────────────────────────────────────────────────────
//

fn status_marker(status: LessonStatus) -> char {
    match status {
        LessonStatus::Completed => 'x',
        LessonStatus::Active => '>',
        LessonStatus::Locked => ' ',
    }
}

fn print_status(session: &LearnerSession) {
    let entitlement = session.entitlement();
    let tier = if entitlement.is_premium() {
        "premium"
    } else {
        "free"
    };
    println!("Prompt Engineering course ({tier} access)");

    for week in [Week::One, Week::Two] {
        println!();
        println!("{week}");
        for lesson in session.catalog().week(week) {
            let status = session.progress().status_of(lesson.id);
            let score = session
                .progress()
                .get(lesson.id)
                .and_then(LessonProgress::score)
                .map(|score| format!(" ({score}/100)"))
                .unwrap_or_default();
            let paywall = if requires_premium(lesson.id, entitlement) {
                " [premium]"
            } else {
                ""
            };
            println!(
                "  [{}] {:>2}. {}{score}{paywall}",
                status_marker(status),
                lesson.id.value(),
                lesson.short_title()
            );
        }
    }

    println!();
    if session.is_finished() {
        println!("Course complete. Your certificate is unlocked.");
    } else {
        println!("Resume at lesson {}.", session.resume_target());
    }
}

fn print_lesson_body(lesson: &LessonDefinition) {
    println!("{} · Lesson {}: {}", lesson.week, lesson.id, lesson.title);
    println!();
    println!("{}", lesson.theory);
    println!();
    println!("Example:");
    println!("{}", lesson.example);
    println!();
    println!("Task:");
    println!("{}", lesson.task);
    println!();
    println!("Graded on: {}", lesson.grading_criteria);
}

fn print_verdict(result: &GradingResult) {
    let label = if result.passed { "Passed" } else { "Not yet" };
    println!("{label} ({}/100)", result.score);
    println!();
    println!("{}", result.feedback);
}

fn show_lesson(session: &LearnerSession, lesson_id: LessonId) -> Result<(), LearnerError> {
    match session.view(View::Lesson(lesson_id)) {
        ViewDecision::Show(_) => {}
        ViewDecision::Paywall(view) => {
            println!("{view} is part of the premium course. Run `app unlock` to continue.");
            return Ok(());
        }
        ViewDecision::Locked(view) => {
            println!("{view} is locked. Complete the previous lessons first.");
            return Ok(());
        }
        ViewDecision::NotFound(_) => return Err(LearnerError::UnknownLesson(lesson_id)),
    }

    let lesson = session
        .catalog()
        .get(lesson_id)
        .ok_or(LearnerError::UnknownLesson(lesson_id))?;
    print_lesson_body(lesson);

    if let Some(entry) = session
        .progress()
        .get(lesson_id)
        .filter(|entry| entry.status() == LessonStatus::Completed)
    {
        println!();
        println!("Completed with {}/100.", entry.score().unwrap_or(0));
        if let Some(feedback) = entry.feedback() {
            println!("{feedback}");
        }
    }
    Ok(())
}

fn show_certificate(session: &LearnerSession, name: Option<&str>) {
    if !matches!(session.view(View::Certificate), ViewDecision::Show(_)) {
        println!(
            "The certificate unlocks once every lesson is complete. Resume at lesson {}.",
            session.resume_target()
        );
        return;
    }

    let scores: Vec<u32> = session
        .progress()
        .iter()
        .filter_map(|(_, entry)| entry.score())
        .collect();
    let average = if scores.is_empty() {
        0
    } else {
        scores.iter().sum::<u32>() / u32::try_from(scores.len()).unwrap_or(1)
    };
    let name = name.map(str::trim).filter(|name| !name.is_empty()).unwrap_or("Student");

    println!("CERTIFICATE OF COMPLETION");
    println!();
    println!("This certifies that {name}");
    println!(
        "has completed the {}-lesson practical program",
        session.catalog().len()
    );
    println!("\"Prompt Engineering: From Basics to Mastery\"");
    println!();
    println!("Average score: {average}/100");
    println!("Issued: {}", Clock::system().now().format("%Y-%m-%d"));
}

async fn submit(
    session: &mut LearnerSession,
    mentor: &MentorService,
    lesson_id: LessonId,
    source: SubmissionSource,
) -> Result<(), Box<dyn std::error::Error>> {
    let text = match source {
        SubmissionSource::Inline(text) => text,
        SubmissionSource::File(path) => std::fs::read_to_string(path)?,
    };
    if !mentor.enabled() {
        warn!("LEARN_AI_API_KEY is not set; submissions cannot be graded");
    }

    match session.submit(mentor, lesson_id, &text).await? {
        SubmissionOutcome::Passed {
            result,
            unlocked,
            finished,
        } => {
            print_verdict(&result);
            if let Some(next) = unlocked {
                println!();
                println!("Lesson {next} unlocked.");
            }
            if finished {
                println!();
                println!("Course complete. Your certificate is unlocked.");
            }
        }
        SubmissionOutcome::Failed(result) => print_verdict(&result),
        SubmissionOutcome::Stale => println!("A newer submission replaced this one."),
    }
    Ok(())
}

async fn practice(
    session: &LearnerSession,
    mentor: &MentorService,
    answer: Option<String>,
) -> Result<(), Box<dyn std::error::Error>> {
    if !matches!(session.view(View::InfinitePractice), ViewDecision::Show(_)) {
        println!("Infinite practice is a premium feature. Run `app unlock` to continue.");
        return Ok(());
    }

    let task = mentor.generate_task().await?;
    print_lesson_body(&task);

    if let Some(answer) = answer.filter(|answer| !answer.trim().is_empty()) {
        let result = mentor.grade(&GradingRequest::for_lesson(&task, answer)).await;
        println!();
        print_verdict(&result);
    }
    Ok(())
}

fn library(
    session: &LearnerSession,
    category: Option<PromptCategory>,
    query: &str,
    copy: Option<&str>,
) -> Result<(), Box<dyn std::error::Error>> {
    let library = PromptLibrary::builtin();
    let access = library_access(session.entitlement());

    if let Some(id) = copy {
        println!("{}", library.copy(id, access)?);
        return Ok(());
    }

    let templates = library.filter(category, query);
    if templates.is_empty() {
        println!("No templates match.");
    }
    for template in templates {
        println!("{:<4}{} [{}]", template.id, template.title, template.category);
        println!("    {}", template.description);
    }
    if access == LibraryAccess::Preview {
        println!();
        println!("Copying templates requires premium access.");
    }
    Ok(())
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::from_env_and_args(std::env::args().skip(1)).inspect_err(|_| print_usage())?;

    info!(platform = %args.host, "host platform");
    for call in args.host.handshake() {
        debug!(platform = %args.host, call, "host handshake");
    }

    // Open + migrate SQLite in the binary glue so core/services stay storage-agnostic.
    ensure_database_dir(&args.db_url)?;
    let storage = Storage::sqlite(&args.db_url).await?;
    let catalog = Arc::new(Catalog::builtin());
    let mut session =
        LearnerSession::load(catalog, Arc::clone(&storage.slots), Clock::system()).await;

    match args.command {
        Command::Status => print_status(&session),
        Command::Lesson(lesson_id) => show_lesson(&session, lesson_id)?,
        Command::Submit { lesson_id, source } => {
            let mentor = MentorService::from_env()?;
            submit(&mut session, &mentor, lesson_id, source).await?;
        }
        Command::Export => println!("{}", session.export_code()),
        Command::Import(code) => {
            let resume = session.import_code(&code).await?;
            println!("Progress restored. Resume at lesson {resume}.");
        }
        Command::Unlock => {
            if session.grant_premium().await? {
                println!("Premium access unlocked.");
            } else {
                println!("Premium access is already active.");
            }
        }
        Command::Certificate { name } => show_certificate(&session, name.as_deref()),
        Command::Practice { answer } => {
            let mentor = MentorService::from_env()?;
            practice(&session, &mentor, answer).await?;
        }
        Command::Library {
            category,
            query,
            copy,
        } => library(&session, category, &query, copy.as_deref())?,
    }

    Ok(())
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, ArgsError> {
        Args::parse(None, None, args.iter().map(|arg| (*arg).to_string()))
    }

    #[test]
    fn no_arguments_show_status() {
        let args = parse(&[]).unwrap();
        assert_eq!(args.command, Command::Status);
        assert_eq!(args.db_url, DEFAULT_DB_URL);
        assert_eq!(args.host, HostPlatform::Standalone);
    }

    #[test]
    fn submit_joins_inline_words() {
        let args = parse(&["submit", "2", "Act", "as", "a", "chef"]).unwrap();
        assert_eq!(
            args.command,
            Command::Submit {
                lesson_id: LessonId::new(2),
                source: SubmissionSource::Inline("Act as a chef".into()),
            }
        );
    }

    #[test]
    fn submit_rejects_text_and_file_together() {
        let err = parse(&["submit", "1", "text", "--file", "answer.txt"]).unwrap_err();
        assert!(matches!(err, ArgsError::ConflictingSubmission));
        let err = parse(&["submit", "1"]).unwrap_err();
        assert!(matches!(err, ArgsError::MissingArgument { .. }));
    }

    #[test]
    fn global_flags_may_appear_anywhere() {
        let args = parse(&["export", "--host", "tg", "--db", "sqlite::memory:"]).unwrap();
        assert_eq!(args.command, Command::Export);
        assert_eq!(args.host, HostPlatform::Telegram);
        assert_eq!(args.db_url, "sqlite::memory:");
    }

    #[test]
    fn environment_supplies_defaults() {
        let args = Args::parse(
            Some("sqlite:///tmp/course.sqlite3".into()),
            Some("vk".into()),
            Vec::<String>::new(),
        )
        .unwrap();
        assert_eq!(args.db_url, "sqlite:///tmp/course.sqlite3");
        assert_eq!(args.host, HostPlatform::Vk);
    }

    #[test]
    fn flags_must_belong_to_the_subcommand() {
        let err = parse(&["status", "--query", "seo"]).unwrap_err();
        assert!(matches!(err, ArgsError::UnexpectedFlag { flag: "--query" }));
    }

    #[test]
    fn library_flags_are_parsed() {
        let args = parse(&["library", "--category", "coding", "--query", "review"]).unwrap();
        assert_eq!(
            args.command,
            Command::Library {
                category: Some(PromptCategory::Coding),
                query: "review".into(),
                copy: None,
            }
        );
    }

    #[test]
    fn bad_values_are_reported() {
        assert!(matches!(
            parse(&["lesson", "zero"]).unwrap_err(),
            ArgsError::InvalidLessonId { .. }
        ));
        assert!(matches!(
            parse(&["--host", "desktop"]).unwrap_err(),
            ArgsError::InvalidHost { .. }
        ));
        assert!(matches!(
            parse(&["dance"]).unwrap_err(),
            ArgsError::UnknownCommand(_)
        ));
        assert!(matches!(
            parse(&["import"]).unwrap_err(),
            ArgsError::MissingArgument { what: "sync code" }
        ));
    }

    #[test]
    fn certificate_takes_an_optional_name() {
        assert_eq!(
            parse(&["certificate", "--name", "Ada"]).unwrap().command,
            Command::Certificate {
                name: Some("Ada".into())
            }
        );
        assert_eq!(
            parse(&["certificate"]).unwrap().command,
            Command::Certificate { name: None }
        );
        assert!(matches!(
            parse(&["export", "--name", "Ada"]).unwrap_err(),
            ArgsError::UnexpectedFlag { flag: "--name" }
        ));
    }

    #[test]
    fn database_directory_is_created_but_not_the_file() {
        let dir = std::env::temp_dir()
            .join(format!("course-app-{}", std::process::id()))
            .join("nested");
        let file = dir.join("course.sqlite3");
        let url = format!("sqlite://{}", file.display());

        ensure_database_dir(&url).unwrap();
        assert!(dir.is_dir());
        assert!(!file.exists());

        ensure_database_dir("sqlite::memory:").unwrap();
        ensure_database_dir("sqlite:file:shared?mode=memory&cache=shared").unwrap();
        std::fs::remove_dir_all(dir.parent().unwrap()).unwrap();
    }

    #[test]
    fn relative_sqlite_paths_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/course.sqlite3");
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/course.sqlite3"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:"), "sqlite::memory:");
    }
}

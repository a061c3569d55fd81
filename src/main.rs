mod ui;

use chirp::{
    app_dirs::AppDirs,
    catalog::ItemCatalog,
    config::{Config, ConfigStore, DisplayLabels, FileConfigStore},
    error::QuizError,
    metadata::Id3Reader,
    player::{self, Player},
    quiz::{Quiz, QuizState},
    runtime::{AppEvent, Runner, TerminalEvents, TICK_INTERVAL},
    selection::SelectionEngine,
    source::DirectorySource,
};
use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    error::Error,
    fs::{self, OpenOptions},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use webbrowser::Browser;

const LIBRARY_URL: &str =
    "https://www.macaulaylibrary.org/product/the-cornell-guide-to-bird-sounds-us-and-canada/";

/// birdsong quiz: listen to a recording, reveal the bird, and keep score
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal birdsong quiz. Recordings are drawn at random from a folder of tagged MP3 files; birds you name correctly leave the rotation until every one has been mastered."
)]
pub struct Cli {
    /// folder containing the recordings
    #[clap(short = 'd', long)]
    sounds_dir: Option<PathBuf>,

    /// file extension of the recordings
    #[clap(short = 'e', long)]
    extension: Option<String>,

    /// file listing the recordings excluded for missing metadata
    #[clap(short = 'r', long)]
    report_file: Option<PathBuf>,

    /// external command used to play a recording instead of the built-in decoder, e.g. "mpg123 -q"
    #[clap(short = 'p', long)]
    player: Option<String>,

    /// do not play any audio
    #[clap(long)]
    no_audio: bool,

    /// validate the recordings, print the report and exit
    #[clap(long)]
    check: bool,

    /// store the effective settings as the new defaults
    #[clap(long)]
    save_config: bool,

    /// config file to use instead of the platform default
    #[clap(long)]
    config: Option<PathBuf>,
}

impl Cli {
    /// Layer command line flags over the stored configuration
    fn apply_to(&self, mut config: Config) -> Config {
        if let Some(dir) = &self.sounds_dir {
            config.sounds_dir = dir.clone();
        }
        if let Some(ext) = &self.extension {
            config.extension = ext.clone();
        }
        if let Some(report) = &self.report_file {
            config.report_file = report.clone();
        }
        if let Some(cmd) = &self.player {
            let argv: Vec<String> = cmd.split_whitespace().map(str::to_string).collect();
            config.player = (!argv.is_empty()).then_some(argv);
        }
        if self.no_audio {
            config.audio = false;
        }
        config
    }

    fn config_store(&self) -> FileConfigStore {
        match &self.config {
            Some(path) => FileConfigStore::with_path(path),
            None => FileConfigStore::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AppState {
    Notice,
    Quiz,
    Exhausted,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct App {
    pub quiz: Quiz,
    pub player: Box<dyn Player>,
    pub labels: DisplayLabels,
    pub state: AppState,
    pub notice: Option<String>,
    pub status: Option<String>,
}

impl App {
    pub fn new(
        mut quiz: Quiz,
        player: Box<dyn Player>,
        labels: DisplayLabels,
        notice: Option<String>,
    ) -> Result<Self, QuizError> {
        let state = match quiz.start()? {
            QuizState::Exhausted => AppState::Exhausted,
            QuizState::Active if notice.is_some() => AppState::Notice,
            QuizState::Active => AppState::Quiz,
        };
        let mut app = Self {
            quiz,
            player,
            labels,
            state,
            notice,
            status: None,
        };
        if app.state == AppState::Quiz {
            app.play_current();
        }
        Ok(app)
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Flow {
        let ctrl_c =
            key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c');
        if key.code == KeyCode::Esc || ctrl_c {
            return Flow::Quit;
        }
        self.status = None;

        match self.state {
            AppState::Notice => {
                self.state = AppState::Quiz;
                self.play_current();
            }
            AppState::Quiz => match key.code {
                KeyCode::Char('q') => return Flow::Quit,
                KeyCode::Char('r') | KeyCode::Char(' ') => self.play_current(),
                KeyCode::Enter | KeyCode::Char('v') => {
                    if let Err(err) = self.quiz.reveal() {
                        self.status = Some(err.to_string());
                    }
                }
                KeyCode::Char('s') | KeyCode::Right => {
                    let result = self.quiz.next();
                    self.after_transition(result);
                }
                KeyCode::Char('y') => {
                    let result = self.quiz.answer(true);
                    self.after_transition(result);
                }
                KeyCode::Char('n') => {
                    let result = self.quiz.answer(false);
                    self.after_transition(result);
                }
                KeyCode::Char('o') => self.open_recording_page(),
                _ => {}
            },
            AppState::Exhausted => match key.code {
                KeyCode::Char('q') => return Flow::Quit,
                KeyCode::Char('y') => {
                    let result = self.quiz.confirm_repopulate(true);
                    self.after_transition(result);
                }
                KeyCode::Char('n') => {
                    let result = self.quiz.confirm_repopulate(false);
                    self.after_transition(result);
                }
                _ => {}
            },
        }
        Flow::Continue
    }

    fn after_transition(&mut self, result: Result<QuizState, QuizError>) {
        match result {
            Ok(QuizState::Active) => {
                self.state = AppState::Quiz;
                self.play_current();
            }
            Ok(QuizState::Exhausted) => {
                self.player.stop();
                self.state = AppState::Exhausted;
            }
            Err(err) => self.status = Some(err.to_string()),
        }
    }

    fn play_current(&mut self) {
        let Some(path) = self.quiz.current_item().map(|item| item.path.clone()) else {
            return;
        };
        if let Err(err) = self.player.play(&path) {
            warn!("could not play {}: {err}", path.display());
            self.status = Some(format!("could not play recording: {err}"));
        }
    }

    fn open_recording_page(&mut self) {
        if !self.quiz.stage().info_visible() || !Browser::is_available() {
            return;
        }
        let url = self
            .quiz
            .current_item()
            .and_then(|item| item.details.as_ref())
            .and_then(|details| details.recording_url());
        if let Some(url) = url {
            if let Err(err) = webbrowser::open(&url) {
                self.status = Some(format!("could not open {url}: {err}"));
            }
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logging(!cli.check);

    let store = cli.config_store();
    let config = cli.apply_to(store.load());
    if cli.save_config {
        store.save(&config)?;
        info!("saved settings to {}", store.path().display());
    }

    let catalog = match load_catalog(&config) {
        Ok(catalog) => catalog,
        Err(err) => {
            eprintln!("{}", user_message(&err, &config));
            std::process::exit(1);
        }
    };

    if cli.check {
        if let Some(report) = catalog.report() {
            print!("{report}");
            println!(
                "\n{} of {} sound files are eligible for the quiz.",
                report.eligible(),
                report.checked
            );
        }
        return Ok(());
    }

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let notice = catalog
        .report()
        .filter(|report| report.has_exclusions())
        .map(|report| {
            format!(
                "{} of {} sound files are missing metadata and will not be included in the quiz.\n\nSee {} for details.",
                report.exclusions.len(),
                report.checked,
                config.report_file.display()
            )
        });
    let quiz = Quiz::new(catalog, SelectionEngine::new(config.max_redraws));
    let player = player::from_config(&config);
    let mut app = App::new(quiz, player, config.labels.clone(), notice)?;

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = start_tui(&mut terminal, &mut app);
    app.player.stop();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

/// Enumerate and validate the recordings, writing the exclusion report
/// whether or not anything survived.
fn load_catalog(config: &Config) -> Result<ItemCatalog, QuizError> {
    let source = DirectorySource::new(&config.sounds_dir, &config.extension);
    let mut catalog = ItemCatalog::build(&source)?;
    let validation = catalog.run_validation_pass(&Id3Reader);

    if let Some(report) = catalog.report() {
        if let Err(err) = report.write_to(&config.report_file) {
            warn!(
                "could not write {}: {err}",
                config.report_file.display()
            );
        }
    }

    validation?;
    Ok(catalog)
}

fn user_message(err: &QuizError, config: &Config) -> String {
    match err {
        QuizError::NoItemsFound(_) => format!(
            "{err}.\n\nA compilation of recordings for the US and Canada can be obtained here:\n\n{LIBRARY_URL}"
        ),
        QuizError::AllItemsInvalid { .. } => format!(
            "{err}.\n\nOnly recordings from the Macaulay Library carry the required metadata. See {} for details.\n\n{LIBRARY_URL}",
            config.report_file.display()
        ),
        other => other.to_string(),
    }
}

/// Logs go to stderr for one-shot runs and to a file while the TUI owns the
/// terminal.
fn init_logging(to_file: bool) {
    let filter = EnvFilter::try_from_env("CHIRP_LOG").unwrap_or_else(|_| EnvFilter::new("chirp=info"));

    if !to_file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
        return;
    }

    let file = AppDirs::log_path().and_then(|path| {
        fs::create_dir_all(path.parent()?).ok()?;
        OpenOptions::new().create(true).append(true).open(path).ok()
    });
    if let Some(file) = file {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .init();
    }
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let runner = Runner::new(TerminalEvents::new(), TICK_INTERVAL);

    terminal.draw(|f| ui(app, f))?;
    loop {
        match runner.step() {
            AppEvent::Tick | AppEvent::Resize => {}
            AppEvent::Key(key) => {
                if app.handle_key(key) == Flow::Quit {
                    break;
                }
            }
        }
        terminal.draw(|f| ui(app, f))?;
    }

    Ok(())
}

fn ui(app: &App, f: &mut Frame) {
    f.render_widget(app, f.area());
}

#[cfg(test)]
mod tests {
    use super::*;
    use chirp::metadata::{Image, MetadataError, RawMetadata};
    use chirp::player::{PlayerError, PlayerKind};
    use chirp::quiz::Stage;
    use chirp::source::StaticSource;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    /// Remembers every recording it was asked to play
    #[derive(Clone, Default)]
    struct RecordingPlayer {
        played: Rc<RefCell<Vec<PathBuf>>>,
        stops: Rc<RefCell<usize>>,
    }

    impl Player for RecordingPlayer {
        fn play(&mut self, path: &Path) -> Result<(), PlayerError> {
            self.played.borrow_mut().push(path.to_path_buf());
            Ok(())
        }

        fn stop(&mut self) {
            *self.stops.borrow_mut() += 1;
        }
    }

    fn key(c: char) -> KeyEvent {
        KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
    }

    fn quiz(names: &[&str]) -> Quiz {
        let paths = names.iter().map(PathBuf::from).collect();
        let mut catalog = ItemCatalog::build(&StaticSource(paths)).unwrap();
        let valid = |_: &Path| -> Result<RawMetadata, MetadataError> {
            Ok(RawMetadata {
                image: Some(Image {
                    mime_type: "image/jpeg".into(),
                    data: vec![0; 2048],
                }),
                annotation: Some("Turdus migratorius; Ithaca, NY; J. Doe; ML12345".into()),
            })
        };
        catalog.run_validation_pass(&valid).unwrap();
        Quiz::new(catalog, SelectionEngine::default())
    }

    fn app(names: &[&str], notice: Option<&str>) -> (App, RecordingPlayer) {
        let player = RecordingPlayer::default();
        let app = App::new(
            quiz(names),
            Box::new(player.clone()),
            DisplayLabels::default(),
            notice.map(str::to_string),
        )
        .unwrap();
        (app, player)
    }

    #[test]
    fn test_cli_default_values() {
        let cli = Cli::try_parse_from(["chirp"]).unwrap();
        assert!(cli.sounds_dir.is_none());
        assert!(cli.player.is_none());
        assert!(!cli.no_audio);
        assert!(!cli.check);
        assert_eq!(cli.apply_to(Config::default()), Config::default());
    }

    #[test]
    fn test_cli_overrides_config() {
        let cli = Cli::try_parse_from([
            "chirp",
            "-d",
            "/srv/birds",
            "--extension",
            "ogg",
            "--report-file",
            "check.log",
            "--player",
            "mpg123 -q",
        ])
        .unwrap();
        let config = cli.apply_to(Config::default());
        assert_eq!(config.sounds_dir, PathBuf::from("/srv/birds"));
        assert_eq!(config.extension, "ogg");
        assert_eq!(config.report_file, PathBuf::from("check.log"));
        assert_eq!(
            config.player,
            Some(vec!["mpg123".to_string(), "-q".to_string()])
        );
    }

    #[test]
    fn test_cli_no_audio_wins() {
        let cli = Cli::try_parse_from(["chirp", "--player", "mpv", "--no-audio"]).unwrap();
        let stored = Config {
            player: Some(vec!["afplay".into()]),
            ..Config::default()
        };
        let config = cli.apply_to(stored);
        assert!(!config.audio);
        assert_eq!(PlayerKind::for_config(&config), PlayerKind::Silent);
    }

    #[test]
    fn test_cli_blank_player_is_none() {
        let cli = Cli::try_parse_from(["chirp", "--player", "  "]).unwrap();
        assert_eq!(cli.apply_to(Config::default()).player, None);
    }

    #[test]
    fn test_app_starts_playing_without_notice() {
        let (app, player) = app(&["Blue Jay 01.mp3", "Wren 02.mp3"], None);
        assert_eq!(app.state, AppState::Quiz);
        assert_eq!(player.played.borrow().len(), 1);
    }

    #[test]
    fn test_notice_is_dismissed_by_any_key() {
        let (mut app, player) = app(&["Blue Jay 01.mp3"], Some("2 files excluded"));
        assert_eq!(app.state, AppState::Notice);
        assert!(player.played.borrow().is_empty());

        assert_eq!(app.handle_key(key('x')), Flow::Continue);
        assert_eq!(app.state, AppState::Quiz);
        assert_eq!(player.played.borrow().len(), 1);
    }

    #[test]
    fn test_answer_before_reveal_sets_status() {
        let (mut app, _) = app(&["Blue Jay 01.mp3", "Wren 02.mp3"], None);
        app.handle_key(key('y'));
        assert!(app.status.is_some());
        assert_eq!(app.quiz.tracker().attempts(), 0);
    }

    #[test]
    fn test_full_round_reaches_exhausted_and_repopulates() {
        let (mut app, player) = app(&["Blue Jay 01.mp3", "Wren 02.mp3"], None);

        for _ in 0..2 {
            app.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE));
            assert_eq!(app.quiz.stage(), Stage::ImageRevealed);
            app.handle_key(key('v'));
            assert_eq!(app.quiz.stage(), Stage::InfoRevealed);
            app.handle_key(key('y'));
        }
        assert_eq!(app.state, AppState::Exhausted);
        assert_eq!(app.quiz.remaining(), 0);
        assert!(*player.stops.borrow() >= 1);

        app.handle_key(key('n'));
        assert_eq!(app.state, AppState::Quiz);
        assert_eq!(app.quiz.remaining(), 2);
        assert_eq!(app.quiz.tracker().attempts(), 2);
    }

    #[test]
    fn test_reset_on_confirm_clears_score() {
        let (mut app, _) = app(&["Blue Jay 01.mp3"], None);
        app.handle_key(key('v'));
        app.handle_key(key('y'));
        assert_eq!(app.state, AppState::Exhausted);
        app.handle_key(key('y'));
        assert_eq!(app.state, AppState::Quiz);
        assert_eq!(app.quiz.tracker().attempts(), 0);
    }

    #[test]
    fn test_skip_and_replay_play_again() {
        let (mut app, player) = app(&["Blue Jay 01.mp3", "Wren 02.mp3"], None);
        let first = player.played.borrow()[0].clone();

        app.handle_key(key('r'));
        assert_eq!(player.played.borrow()[1], first);

        app.handle_key(key('s'));
        assert_ne!(player.played.borrow()[2], first);
        assert_eq!(app.quiz.tracker().attempts(), 0);
    }

    #[test]
    fn test_quit_keys() {
        let (mut app, _) = app(&["Blue Jay 01.mp3"], None);
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)),
            Flow::Quit
        );
        assert_eq!(
            app.handle_key(KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)),
            Flow::Quit
        );
        assert_eq!(app.handle_key(key('q')), Flow::Quit);
    }

    #[test]
    fn test_user_message_hints() {
        let config = Config::default();
        let msg = user_message(&QuizError::NoItemsFound(PathBuf::from("sounds")), &config);
        assert!(msg.contains("macaulaylibrary.org"));
        let msg = user_message(&QuizError::AllItemsInvalid { checked: 3 }, &config);
        assert!(msg.contains("sounds-check.log"));
    }

    #[test]
    fn test_load_catalog_reports_missing_dir() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            sounds_dir: dir.path().join("sounds"),
            report_file: dir.path().join("check.log"),
            ..Config::default()
        };
        assert!(matches!(
            load_catalog(&config),
            Err(QuizError::SourceDirectoryMissing(_))
        ));
    }

    #[test]
    fn test_load_catalog_writes_report_when_all_invalid() {
        let dir = tempfile::tempdir().unwrap();
        let sounds = dir.path().join("sounds");
        fs::create_dir(&sounds).unwrap();
        fs::write(sounds.join("Blue Jay 01.mp3"), vec![0u8; 32]).unwrap();
        let config = Config {
            sounds_dir: sounds,
            report_file: dir.path().join("check.log"),
            ..Config::default()
        };

        assert!(matches!(
            load_catalog(&config),
            Err(QuizError::AllItemsInvalid { checked: 1 })
        ));
        let written = fs::read_to_string(dir.path().join("check.log")).unwrap();
        assert!(written.contains("Blue Jay 01.mp3: missing image"));
    }
}

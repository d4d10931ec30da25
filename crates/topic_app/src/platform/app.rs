use std::io::{self, BufRead};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::mpsc;
use std::thread;

use anyhow::{anyhow, Context, Result};
use engine_logging::{engine_info, engine_warn};
use topic_core::{
    update, AppState, DraftField, FileStatus, InputFile, Msg, RunState, SettingsEdit, Slot,
};
use topic_engine::{inspect_path, InputStatus};

use super::console::{self, ConsoleCommand};
use super::effects::EffectRunner;
use super::ui::{constants, layout, Renderer};
use super::{persistence, AppOptions, RunJob};

/// Everything the main loop reacts to.
pub(crate) enum Inbound {
    Msg(Msg),
    Line(String),
    InputClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

struct App {
    state: AppState,
    effects: EffectRunner,
    renderer: Renderer,
}

impl App {
    fn start(options: &AppOptions, inbound: mpsc::Sender<Inbound>) -> Result<Self> {
        let settings = persistence::load_settings(&options.settings_path);
        let effects = EffectRunner::new(
            inbound,
            options.backend,
            &settings,
            options.settings_path.clone(),
        )
        .context("failed to start the job engine")?;
        let mut app = Self {
            state: AppState::new(),
            effects,
            renderer: Renderer::new(),
        };
        app.dispatch(Msg::RestoreSettings(settings));
        Ok(app)
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (state, effects) = update(state, msg);
        self.state = state;
        if !effects.is_empty() {
            self.effects.run(effects, self.state.settings());
        }
    }

    /// Prints whatever changed since the last flush.
    fn flush(&mut self) {
        if self.state.consume_dirty() {
            print_lines(self.renderer.render(&self.state.view()));
        }
    }

    fn show(&mut self) {
        self.state.consume_dirty();
        let view = self.state.view();
        self.renderer.mark_shown(&view);
        print_lines(layout::full_frame(&view));
    }

    fn select_input(&mut self, slot: Slot, path: PathBuf) {
        let input = checked_file(path);
        self.dispatch(Msg::InputSelected { slot, input });
    }

    fn edit_field(&mut self, slot: Slot, field: DraftField, value: String) {
        let value = value.trim();
        if field.is_file_path() && !matches!(value, "" | "none") {
            let file = checked_file(PathBuf::from(value));
            self.dispatch(Msg::FileSelected { slot, field, file });
        } else {
            self.dispatch(Msg::DraftEdited {
                slot,
                field,
                value: value.to_string(),
            });
        }
        let error = self
            .state
            .view()
            .slot(slot)
            .and_then(|view| view.form.iter().find(|entry| entry.field == field))
            .and_then(|entry| entry.error.clone());
        if let Some(error) = error {
            println!("[{slot}] {error}");
        }
    }

    fn handle_command(&mut self, command: ConsoleCommand) -> Flow {
        match command {
            ConsoleCommand::Screen(screen) => {
                self.dispatch(Msg::ScreenSelected(screen));
                self.show();
            }
            ConsoleCommand::Input { slot, path } => self.select_input(slot, path),
            ConsoleCommand::Set { slot, field, value } => self.edit_field(slot, field, value),
            ConsoleCommand::Config(edit) => {
                let restart_needed =
                    matches!(edit, SettingsEdit::WorkerProgram(_) | SettingsEdit::WorkerArgs(_));
                self.dispatch(Msg::SettingsEdited(edit));
                if restart_needed && self.state.view().settings_error.is_none() {
                    println!("[settings] the worker command takes effect after a restart");
                }
            }
            ConsoleCommand::Submit(slot) => self.dispatch(Msg::SubmitRequested(slot)),
            ConsoleCommand::Cancel(slot) => {
                if self.state.run_state(slot) != RunState::Running {
                    println!("[{slot}] nothing to cancel");
                }
                self.dispatch(Msg::CancelRequested(slot));
            }
            ConsoleCommand::Show => self.show(),
            ConsoleCommand::Help => print_lines(layout::help()),
            ConsoleCommand::Quit => return Flow::Quit,
        }
        Flow::Continue
    }

    fn cancel_running(&mut self) {
        for slot in Slot::ALL {
            if self.state.run_state(slot) == RunState::Running {
                self.dispatch(Msg::CancelRequested(slot));
            }
        }
        self.flush();
    }

    /// Keeps relaying job events until no slot has an active job.
    fn wait_until_settled(&mut self, rx: &mpsc::Receiver<Inbound>) {
        if !self.state.is_settled() {
            engine_info!("Waiting for active jobs before exiting");
        }
        while !self.state.is_settled() {
            match rx.recv() {
                Ok(Inbound::Msg(Msg::Tick)) => {
                    self.dispatch(Msg::Tick);
                    self.flush();
                }
                Ok(Inbound::Msg(msg)) => self.dispatch(msg),
                Ok(Inbound::Line(_) | Inbound::InputClosed) => {}
                Err(_) => break,
            }
        }
        self.flush();
    }
}

fn checked_file(path: PathBuf) -> InputFile {
    let status = match inspect_path(&path) {
        InputStatus::Present => FileStatus::Present,
        InputStatus::Empty => FileStatus::Empty,
        InputStatus::Missing => FileStatus::Missing,
        InputStatus::NotAFile => FileStatus::NotAFile,
    };
    if status != FileStatus::Present {
        engine_warn!("File {} is not usable as is: {:?}", path.display(), status);
    }
    InputFile::new(path, status)
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

fn spawn_stdin_reader(tx: mpsc::Sender<Inbound>) -> io::Result<()> {
    thread::Builder::new()
        .name("topic-stdin".to_string())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(Inbound::Line(line)).is_err() {
                    return;
                }
            }
            let _ = tx.send(Inbound::InputClosed);
        })
        .map(|_| ())
}

fn spawn_ticker(tx: mpsc::Sender<Inbound>) -> io::Result<()> {
    thread::Builder::new()
        .name("topic-tick".to_string())
        .spawn(move || {
            while tx.send(Inbound::Msg(Msg::Tick)).is_ok() {
                thread::sleep(constants::TICK_INTERVAL);
            }
        })
        .map(|_| ())
}

/// Interactive console session. Returns when the user quits or stdin closes.
/// Quitting cancels active jobs; closed input lets them finish. Either way the
/// session ends only once every job has reported its outcome.
pub fn run_app(options: AppOptions) -> Result<()> {
    let (tx, rx) = mpsc::channel();
    let mut app = App::start(&options, tx.clone())?;
    engine_info!("Workbench started with settings {}", options.settings_path.display());

    app.show();
    println!("Type 'help' for commands.");

    spawn_stdin_reader(tx.clone()).context("failed to start the input reader")?;
    spawn_ticker(tx).context("failed to start the render ticker")?;

    while let Ok(inbound) = rx.recv() {
        match inbound {
            Inbound::Msg(Msg::Tick) => {
                app.dispatch(Msg::Tick);
                app.flush();
            }
            Inbound::Msg(msg) => app.dispatch(msg),
            Inbound::Line(line) => match console::parse(&line) {
                Ok(Some(command)) => {
                    let flow = app.handle_command(command);
                    app.flush();
                    if flow == Flow::Quit {
                        app.cancel_running();
                        break;
                    }
                }
                Ok(None) => {}
                Err(err) => println!("{err}"),
            },
            Inbound::InputClosed => break,
        }
    }

    app.wait_until_settled(&rx);
    engine_info!("Workbench exiting");
    Ok(())
}

/// Runs one job to completion. Exit code 0 on success, 1 when the job fails
/// or is cancelled, 2 when the form does not validate.
pub fn run_once(options: AppOptions, job: RunJob) -> Result<ExitCode> {
    let (tx, rx) = mpsc::channel();
    let mut app = App::start(&options, tx)?;
    let slot = job.slot;
    app.state.consume_dirty();
    app.renderer.mark_shown(&app.state.view());

    app.select_input(slot, job.input);
    for assignment in &job.fields {
        let (field, value) = assignment
            .split_once('=')
            .ok_or_else(|| anyhow!("expected FIELD=VALUE, got '{assignment}'"))?;
        let field: DraftField = field.parse().map_err(anyhow::Error::msg)?;
        app.edit_field(slot, field, value.trim().to_string());
    }

    app.dispatch(Msg::SubmitRequested(slot));
    app.flush();
    if app.state.active_job(slot).is_none() {
        return Ok(ExitCode::from(2));
    }

    while let Ok(inbound) = rx.recv() {
        if let Inbound::Msg(msg) = inbound {
            app.dispatch(msg);
            app.flush();
        }
        if app.state.run_state(slot).is_terminal() {
            break;
        }
    }

    Ok(match app.state.run_state(slot) {
        RunState::Succeeded => ExitCode::SUCCESS,
        _ => ExitCode::FAILURE,
    })
}

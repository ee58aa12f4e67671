//! Lifeline Quiz console binary
//!
//! Plays one session with the built-in questions. Every seat shares the
//! terminal; narration goes to standard output and diagnostics to standard
//! error, filtered by `RUST_LOG`.

use std::{process::ExitCode, sync::Arc};

use lifeline_quiz::{
    console::Inputs,
    game::{Game, Options},
    quiz::bank::QuestionBank,
    session::ConsoleTunnel,
};

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<(), lifeline_quiz::Error> {
    let bank = QuestionBank::builtin()?;
    let mut game = Game::new(
        Options::default(),
        bank,
        Inputs::console(),
        Arc::new(ConsoleTunnel::default()),
    )?;
    let outcome = game.play().await?;
    log::info!("session ended: {outcome:?}");
    Ok(())
}

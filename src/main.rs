// ronda-firmas: fill and sign a round form, then see whether it would submit.
// • --script replays a JSON list of actions (fill, stroke, touch, click, submit).
// • --store-signatures decodes the submitted signatures into JPEG files.
// • --window (feature "window") opens both signature pads in a window:
//   hold LMB to sign, C clears the pad under the cursor, N toggles "sin novedad",
//   Enter submits, ESC quits.

use clap::Parser;
use ronda_firmas::session::{load_script, Outcome};
use ronda_firmas::submission::{process_signatures, RoundSubmission};
use ronda_firmas::{Error, FormLayout, Session};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{error, info};

/// CLI Arguments
#[derive(Parser, Debug)]
#[command(version, about = "Signature capture and validation for hospital round forms")]
struct Args {
    /// Form layout JSON (defaults to the round-entry template ids)
    #[arg(short, long)]
    layout: Option<PathBuf>,

    /// Action script JSON to replay against the form
    #[arg(short, long)]
    script: Option<PathBuf>,

    /// Write the submitted payload here instead of stdout
    #[arg(short, long)]
    out: Option<PathBuf>,

    /// Decode submitted signatures into JPEG files in this directory
    #[arg(long)]
    store_signatures: Option<PathBuf>,

    /// Open the interactive signature pads
    #[cfg(feature = "window")]
    #[arg(short, long)]
    window: bool,
}

fn setup_logging() {
    use tracing_subscriber::prelude::*;

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true);

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn,ronda_firmas=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .init();
}

fn main() -> ExitCode {
    setup_logging();
    match run() {
        Ok(code) => code,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode, Error> {
    let args = Args::parse();

    let layout = match &args.layout {
        Some(path) => FormLayout::load(path)?,
        None => FormLayout::default(),
    };
    let mut session = Session::new(layout)?;

    let mut outcome = Outcome::NotSubmitted;
    if let Some(path) = &args.script {
        let actions = load_script(path)?;
        outcome = session.run(&actions)?;
    }

    #[cfg(feature = "window")]
    if args.window {
        if let Some(o) = pad::run(&mut session)? {
            outcome = o;
        }
    }

    if let (Outcome::Submitted(submission), Some(dir)) = (&outcome, &args.store_signatures) {
        store_signatures(submission, dir)?;
    }

    report(&outcome, args.out.as_ref())
}

fn store_signatures(submission: &RoundSubmission, dir: &Path) -> Result<(), Error> {
    std::fs::create_dir_all(dir)?;
    let stored = process_signatures(submission);
    for file in [stored.servicio, stored.ronda].into_iter().flatten() {
        let path = dir.join(&file.filename);
        std::fs::write(&path, &file.bytes)?;
        info!(path = %path.display(), width = file.width, height = file.height, "signature stored");
    }
    Ok(())
}

/// Print the payload (or the blocking errors). Blocked submits exit with 2.
fn report(outcome: &Outcome, out: Option<&PathBuf>) -> Result<ExitCode, Error> {
    match outcome {
        Outcome::Submitted(submission) => {
            let json = serde_json::to_string_pretty(submission)?;
            match out {
                Some(path) => std::fs::write(path, json)?,
                None => println!("{json}"),
            }
            Ok(ExitCode::SUCCESS)
        }
        Outcome::Blocked(errors) => {
            eprintln!("Errores en el formulario:");
            for e in errors {
                eprintln!("  - {e}");
            }
            Ok(ExitCode::from(2))
        }
        Outcome::NotSubmitted => Ok(ExitCode::SUCCESS),
    }
}

#[cfg(feature = "window")]
mod pad {
    use minifb::Key;
    use ronda_firmas::draw::{compose_pad_view, Drawer};
    use ronda_firmas::input::{PointerEvent, PointerKind};
    use ronda_firmas::session::Outcome;
    use ronda_firmas::types::Point;
    use ronda_firmas::{Error, Page, RoundFormValidator, Session, SignatureSlot};
    use tracing::info;

    const BACKGROUND: u32 = 0x00_E9_EC_EF;
    const DIVIDER: u32 = 0x00_6C_75_7D;

    /// Window pixel -> (pad, client point). Pads are stacked in slot order with
    /// a 1px divider, the same way `compose_pad_view` lays them out.
    fn locate(validator: &RoundFormValidator, page: &Page, x: f32, y: f32) -> Option<(SignatureSlot, Point)> {
        let mut top = 0.0;
        for (slot, sig) in validator.signatures() {
            let (w, h) = (sig.raster().width as f32, sig.raster().height as f32);
            if x < w && y >= top && y < top + h {
                let rect = page.element(sig.surface()).rect;
                return Some((slot, Point::new(rect.left + x, rect.top + (y - top))));
            }
            top += h + 1.0;
        }
        None
    }

    pub fn run(session: &mut Session) -> Result<Option<Outcome>, Error> {
        let view = {
            let rasters: Vec<_> = session.validator().signatures().map(|(_, s)| s.raster()).collect();
            compose_pad_view(&rasters, BACKGROUND, DIVIDER)
        };
        let mut drawer = Drawer::new("Ronda - firmas", view.width.max(1), view.height.max(1))?;

        let mut active: Option<SignatureSlot> = None;
        let mut outcome = None;

        while drawer.is_open() && !drawer.esc_pressed() {
            let down = drawer.left_mouse_down();
            let (page, validator) = session.parts_mut();
            let hit = drawer.mouse_pos().and_then(|(x, y)| locate(validator, page, x, y));

            // End a stroke that lifted or wandered off its pad.
            if let Some(slot) = active {
                match hit {
                    Some((s, at)) if down && s == slot => {
                        validator.pointer(page, slot, &PointerEvent { kind: PointerKind::Move, client: at });
                    }
                    _ => {
                        let kind = if down { PointerKind::Out } else { PointerKind::Up };
                        validator.pointer(page, slot, &PointerEvent { kind, client: Point::default() });
                        active = None;
                    }
                }
            } else if down && let Some((slot, at)) = hit {
                validator.pointer(page, slot, &PointerEvent { kind: PointerKind::Down, client: at });
                active = Some(slot);
            }

            if drawer.pressed_once(Key::C)
                && let Some((slot, _)) = hit
            {
                validator.clear_signature(page, slot);
            }
            if drawer.pressed_once(Key::N) {
                validator.toggle_sin_novedad(page);
            }
            if drawer.pressed_once(Key::Enter) {
                let o = session.submit();
                match &o {
                    Outcome::Blocked(errors) => info!(?errors, "submit blocked"),
                    _ => info!("submit accepted"),
                }
                outcome = Some(o);
            }

            let rasters: Vec<_> = session.validator().signatures().map(|(_, s)| s.raster()).collect();
            drawer.present(&compose_pad_view(&rasters, BACKGROUND, DIVIDER))?;
        }
        Ok(outcome)
    }
}

//! Prints the first game controller's state once per line read from stdin.
//!
//! Output per line: `stickX stickY button0 button2 button9`, axes in
//! `-32768..=32767` (Y positive = down), buttons as `0`/`1`. Exits with
//! status 1 and no output when no controller is connected, and with 0 once
//! stdin is closed. Input lines are treated as opaque bytes.

use std::io::{self, BufRead, Write};

use msb_bridge::poller::{GamepadSource, GilrsGamepad, PadState};

fn format_sample(sample: &PadState) -> String {
    format!(
        "{} {} {} {} {}",
        sample.stick_x,
        sample.stick_y,
        sample.south as u8,
        sample.west as u8,
        sample.left_shoulder as u8
    )
}

fn run(pad: &mut dyn GamepadSource, input: impl BufRead, mut out: impl Write) -> io::Result<()> {
    for line in input.split(b'\n') {
        line?;
        let sample = pad.sample().unwrap_or_default();
        writeln!(out, "{}", format_sample(&sample))?;
        out.flush()?;
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut pad = match GilrsGamepad::open_first() {
        Ok(pad) => pad,
        Err(err) => {
            log::info!("{err}");
            std::process::exit(1);
        }
    };

    let stdin = io::stdin();
    let stdout = io::stdout();
    if let Err(err) = run(&mut pad, stdin.lock(), stdout.lock()) {
        log::error!("I/O failure: {err}");
        std::process::exit(2);
    }
}

//! `vantage serve`: answers protocol requests from stdin on stdout.
//!
//! JSON mode reads one request per line. Binary mode reads bincode frames,
//! each prefixed with its length as a little-endian `u32`.

use std::io::{self, BufRead, Read, Write};

use vantage_core::{SceneSession, World};
use vantage_protocol::{
    decode_request, dispatch, encode_response, request_from_json, response_to_json, ErrorMessage, Response,
};

use crate::SceneArgs;

/// Upper bound on a single binary request frame.
const MAX_FRAME_LEN: usize = 1 << 20;

#[derive(clap::Args, Debug)]
pub struct ServeArgs {
    #[command(flatten)]
    pub scene: SceneArgs,

    /// Length-prefixed bincode frames instead of JSON lines
    #[arg(long)]
    pub binary: bool,
}

pub fn run(args: ServeArgs) -> anyhow::Result<()> {
    let (mut world, mut session) = args.scene.load()?;
    tracing::info!(binary = args.binary, "Serving requests on stdin");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let handled = if args.binary {
        serve_binary(&mut session, &mut world, stdin.lock(), stdout.lock())?
    } else {
        serve_json(&mut session, &mut world, stdin.lock(), stdout.lock())?
    };

    tracing::info!(handled, "Input closed");
    Ok(())
}

/// Answers JSON request lines until EOF. Blank lines are ignored.
pub fn serve_json<R: BufRead, W: Write>(
    session: &mut SceneSession,
    world: &mut dyn World,
    reader: R,
    mut writer: W,
) -> anyhow::Result<usize> {
    let mut handled = 0;
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }

        let response = match request_from_json(&line) {
            Ok(request) => dispatch(session, world, request),
            Err(err) => Response::Error(ErrorMessage::new("bad_request", err.to_string())),
        };
        writeln!(writer, "{}", response_to_json(&response)?)?;
        writer.flush()?;
        handled += 1;
    }
    Ok(handled)
}

/// Answers length-prefixed bincode frames until EOF.
pub fn serve_binary<R: Read, W: Write>(
    session: &mut SceneSession,
    world: &mut dyn World,
    mut reader: R,
    mut writer: W,
) -> anyhow::Result<usize> {
    let mut handled = 0;
    let mut header = [0u8; 4];
    loop {
        match reader.read_exact(&mut header) {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(err) => return Err(err.into()),
        }

        let len = u32::from_le_bytes(header) as usize;
        if len > MAX_FRAME_LEN {
            anyhow::bail!("request frame of {len} bytes exceeds {MAX_FRAME_LEN}");
        }
        let mut frame = vec![0u8; len];
        reader.read_exact(&mut frame)?;

        let response = match decode_request(&frame) {
            Ok(request) => dispatch(session, world, request),
            Err(err) => Response::Error(ErrorMessage::new("bad_request", err.to_string())),
        };
        let bytes = encode_response(&response)?;
        writer.write_all(&(bytes.len() as u32).to_le_bytes())?;
        writer.write_all(&bytes)?;
        writer.flush()?;
        handled += 1;
    }
    Ok(handled)
}

//! Packet intake: a batch file or a stream of JSON lines on stdin.
//!
//! Either way packets arrive on one channel and are enqueued by the session
//! owner, so there is a single consumer of the playback queue.

use std::{
    io::BufRead,
    sync::mpsc::{self, Receiver, TryRecvError},
    thread,
};

use color_eyre::eyre::{Result as EyreResult, WrapErr};
use tracing::{info, warn};

use netsonify::{
    engine::Session,
    packet::{self, Packet},
};

/// Start delivering packets from `input` (`-` means stdin).
pub fn spawn(input: &str) -> EyreResult<Receiver<Packet>> {
    let (tx, rx) = mpsc::channel();

    if input == "-" {
        thread::Builder::new()
            .name("stdin-packets".into())
            .spawn(move || {
                let stdin = std::io::stdin();
                for (line_no, line) in stdin.lock().lines().enumerate() {
                    let line = match line {
                        Ok(line) => line,
                        Err(err) => {
                            warn!(%err, "stdin read failed, stopping packet stream");
                            break;
                        }
                    };
                    if line.trim().is_empty() {
                        continue;
                    }
                    match packet::decode_message(&line) {
                        Ok(packet) => {
                            if tx.send(packet).is_err() {
                                break;
                            }
                        }
                        Err(err) => warn!(line = line_no + 1, %err, "skipping malformed packet message"),
                    }
                }
                info!("packet stream closed");
            })
            .wrap_err("failed to spawn stdin reader")?;
    } else {
        let packets = packet::load_batch(input)
            .wrap_err_with(|| format!("failed to read packets from {input}"))?;
        info!(count = packets.len(), path = input, "loaded packet batch");
        for packet in packets {
            // Receiver is alive in this scope
            let _ = tx.send(packet);
        }
    }

    Ok(rx)
}

/// Move everything waiting on the channel into the session queue.
///
/// Returns `false` once the sender side is gone.
pub fn drain(rx: &Receiver<Packet>, session: &mut Session) -> bool {
    loop {
        match rx.try_recv() {
            Ok(packet) => session.enqueue(packet),
            Err(TryRecvError::Empty) => return true,
            Err(TryRecvError::Disconnected) => return false,
        }
    }
}

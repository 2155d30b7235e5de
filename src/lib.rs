//! reed — read text aloud from the command line.
//!
//! Text goes to the piper speech engine as a child process, and the
//! resulting WAV file is handed to the platform's audio player.  Interactive
//! mode plays in the background and can pause, resume, stop and replay.
//!
//! # Modules
//!
//! | Module        | Responsibility                                          |
//! |---------------|---------------------------------------------------------|
//! | `config`      | `settings.toml`, directories, per-run `SpeechConfig`    |
//! | `platform`    | Player / clipboard discovery, process signals           |
//! | `pipeline`    | Engine and player processes, audio artifacts            |
//! | `playback`    | State machine, background controller, blocking adapter  |
//! | `text`        | Clipboard / file / stdin / argument text; PDF and EPUB  |
//! | `voices`      | Voice name parsing, listing and downloads               |
//! | `interactive` | Prompt loop                                             |
//! | `cli`         | `clap` argument definitions                             |

pub mod cli;
pub mod config;
pub mod interactive;
pub mod pipeline;
pub mod platform;
pub mod playback;
pub mod text;
pub mod voices;

//! Drives a small simulated frame loop with the process-wide profiler and prints
//! a report after every frame.
//!
//! The profiler's own debug events are logged to the terminal as well.

use std::hint::black_box;
use std::thread;
use std::time::Duration;

use frame_profiler::{Report, counter, global, profile_scope};

const FRAMES: u64 = 5;

fn simulate(frame: u64) {
    profile_scope!("simulate", "step");

    for body in 0..(frame + 1) * 10 {
        counter!("bodies_simulated", 1);
        black_box_work(body);
    }
}

fn render(frame: u64) {
    profile_scope!("render", "frame");

    for pass in ["shadows", "opaque", "transparent"] {
        profile_scope!("render_pass", pass);
        counter!("draw_calls", frame + 1);
        thread::sleep(Duration::from_millis(1));
    }
}

fn black_box_work(seed: u64) -> u64 {
    (0..1000_u64).fold(seed, |acc, x| black_box(acc.wrapping_mul(31) ^ x))
}

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    global::initialize(32, 1024, 16).expect("no profiler is installed yet");

    for frame in 0..FRAMES {
        global::begin().expect("the previous frame has ended");

        simulate(frame);
        render(frame);

        global::end().expect("the frame was started above");

        if let Some(profiler) = global::current().get() {
            println!("{}", Report::collect(profiler));
        }
    }

    global::finalize().expect("the profiler was installed above");
}

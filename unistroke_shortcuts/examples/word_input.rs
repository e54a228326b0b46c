//! Registers a couple of gesture shortcuts, replays simulated pointer
//! samples through a recorder, and prints the words they resolve to.

use unistroke::Path2D;
use unistroke_shortcuts::{ShortcutMap, StrokeRecorder, TemplateLibrary};

fn record(samples: &[(f32, f32)]) -> Path2D {
    let mut recorder = StrokeRecorder::new();
    recorder.start();
    for &(x, y) in samples {
        recorder.push(x, y);
    }
    recorder.finish().expect("recording was started")
}

fn sampled_line(from: (f32, f32), to: (f32, f32), samples: usize) -> Vec<(f32, f32)> {
    (0..=samples)
        .map(|i| {
            let t = i as f32 / samples as f32;
            (
                from.0 + t * (to.0 - from.0),
                from.1 + t * (to.1 - from.1),
            )
        })
        .collect()
}

fn main() {
    let mut shortcuts = ShortcutMap::new();

    // An upward caret for "yes" and a downward vee for "no".
    let mut caret = sampled_line((20.0, 160.0), (100.0, 40.0), 20);
    caret.extend(sampled_line((100.0, 40.0), (180.0, 160.0), 20));
    shortcuts
        .add_shortcut("yes", &record(&caret))
        .expect("caret has enough points");

    let mut vee = sampled_line((20.0, 40.0), (100.0, 160.0), 20);
    vee.extend(sampled_line((100.0, 160.0), (180.0, 40.0), 20));
    shortcuts
        .add_shortcut("no", &record(&vee))
        .expect("vee has enough points");

    // Draw the caret again, a little smaller and shifted.
    let mut attempt = sampled_line((40.0, 140.0), (90.0, 60.0), 15);
    attempt.extend(sampled_line((90.0, 60.0), (140.0, 140.0), 15));
    match shortcuts.lookup(&record(&attempt)) {
        Some(matched) => println!("recognized {:?} with score {}", matched.word, matched.score),
        None => println!("no shortcut matched"),
    }

    let json = TemplateLibrary::from_recognizer(shortcuts.recognizer())
        .to_json()
        .expect("library serializes");
    println!("library snapshot is {} bytes of JSON", json.len());
}

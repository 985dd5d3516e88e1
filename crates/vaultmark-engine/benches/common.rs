// Benchmark helper functions - Rust's dead code analysis doesn't understand
// that these are used by benchmark files in the same directory
// See: https://users.rust-lang.org/t/cargo-rustc-benches-awarnings/110111/2
#[allow(dead_code)]
pub fn generate_note(sections: usize) -> String {
    let mut content = String::from("---\ntags: [bench, trip]\n---\n");

    for section in 0..sections {
        content.push_str(&format!("# Day {}\n\n", section));
        content.push_str(&format!(
            "Walked from [[Hut {section}]] to [[Col {section}|the col]] #hiking. Watch the ==loose rock== and see [forecast](https://weather.example.com).\n\n"
        ));
        content.push_str("> [!tip] Water\n> Refill at the spring.\n\n");
        content.push_str(&format!("- [ ] Pack ![[day{section}.gpx]]\n- [x] Book hut\n\n"));

        // Add a diagram occasionally
        if section % 5 == 0 {
            content.push_str("```mermaid\ngraph LR\n  Hut --> Col\n```\n\n");
        }
    }

    content
}

#[allow(dead_code)]
pub fn generate_gpx(points: usize) -> String {
    let mut content = String::from(
        "<?xml version=\"1.0\"?>\n<gpx version=\"1.1\" creator=\"bench\" xmlns=\"http://www.topografix.com/GPX/1/1\">\n<trk><name>Bench</name><trkseg>\n",
    );
    for i in 0..points {
        let step = i as f64 * 0.0001;
        content.push_str(&format!(
            "<trkpt lat=\"{:.6}\" lon=\"{:.6}\"><ele>{:.1}</ele></trkpt>\n",
            45.9 + step,
            7.6 + step,
            2000.0 + (i % 50) as f64
        ));
    }
    content.push_str("</trkseg></trk>\n</gpx>\n");
    content
}

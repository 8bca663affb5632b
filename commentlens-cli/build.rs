use std::path::Path;

fn main() {
    // Rerun if the bundled font changes
    println!("cargo:rerun-if-changed=../assets/fonts/");

    // PDF reports embed a TrueType font; warn early when the bundled one is absent
    let bundled_font = "../assets/fonts/DejaVuSans.ttf";

    if Path::new(bundled_font).exists() {
        println!("cargo:warning=Found report font at: {}", bundled_font);
    } else {
        println!("cargo:warning=Report font not found!");
        println!("cargo:warning=Expected at: {}", bundled_font);
        println!("cargo:warning=PDF export will require --font or export.font_path");
    }
}

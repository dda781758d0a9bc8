use poda_inspector::extract_layout;
use poda_inspector::matcher::{match_page, MatchConfig};
use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: debug_layout <pdf_path> [--page N]");
        std::process::exit(1);
    }

    let only_page: Option<u32> = args
        .iter()
        .position(|a| a == "--page")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse().ok());

    let layout = extract_layout(&args[1]).expect("Failed to extract");
    let config = MatchConfig::default();

    for page in layout
        .pages
        .iter()
        .filter(|p| only_page.map_or(true, |n| p.number == n))
    {
        println!(
            "=== PAGE {} ({:.0}x{:.0}, {} spans, {} images) ===",
            page.number,
            page.width,
            page.height,
            page.spans().count(),
            page.images().count()
        );
        for span in page.spans() {
            println!(
                "  x={:7.1} y={:7.1} fs={:5.1} text={:?}",
                span.x, span.y, span.font_size, span.text
            );
        }
        for image in page.images() {
            println!(
                "  IMG x={:7.1} y={:7.1} w={:7.1} h={:7.1}",
                image.x, image.y, image.width, image.height
            );
        }

        let findings = match_page(page, &config);
        let codes: Vec<&str> = findings.codes.iter().map(|c| c.as_str()).collect();
        println!("  codes: {:?}", codes);
        for verdict in &findings.verdicts {
            println!(
                "  [{}] {} at ({:.1}, {:.1}) -> codigo {}",
                if verdict.present { "ok" } else { "--" },
                verdict.label.category,
                verdict.label.x,
                verdict.label.y,
                verdict.code
            );
        }
        println!();
    }
}

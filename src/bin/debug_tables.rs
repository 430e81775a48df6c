use bom_lookup::selector::rank_candidates;
use bom_lookup::{extract_part_rows_from_table, CandidateTable, PdfTables};
use std::env;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: debug_tables <pdf_path>");
        std::process::exit(1);
    }

    let source = PdfTables::load(&args[1]).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    for page in source.pages() {
        println!(
            "page {}: {:.0}x{:.0}, {} text items",
            page.index,
            page.width,
            page.height,
            page.items.len()
        );
    }
    println!();

    let candidates = rank_candidates(&source).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    for (rank, candidate) in candidates.iter().enumerate() {
        let bbox = candidate.table.bbox();
        let grid = candidate.table.extract();
        let rows = extract_part_rows_from_table(&grid);
        println!(
            "=== #{} page {} bbox=({:.1}, {:.1}, {:.1}, {:.1}) {} rows, {} part rows ===",
            rank,
            candidate.page_index,
            bbox.x0,
            bbox.y0,
            bbox.x1,
            bbox.y1,
            grid.len(),
            rows.len()
        );
        for row in &grid {
            let cells: Vec<&str> = row.iter().map(|c| c.as_deref().unwrap_or("")).collect();
            println!("  | {} |", cells.join(" | "));
        }
        println!();
    }
}

//! `docqa status` and `docqa reset`.

use docqa_core::IndexStatus;

use crate::engine::Engine;

pub fn run_status(engine: &Engine) {
    print_status(&engine.status());
}

pub async fn run_reset(engine: &Engine) {
    let status = engine.reset().await;
    println!("reset");
    println!("  chunks: {}", status.chunk_count);
    println!("ok");
}

fn print_status(status: &IndexStatus) {
    println!("ready:      {}", status.ready);
    println!("documents:  {}", status.document_count);
    println!("chunks:     {}", status.chunk_count);
    match status.dims {
        Some(d) => println!("dims:       {}", d),
        None => println!("dims:       -"),
    }
    println!("generation: {}", status.generation);
    if status.documents.is_empty() {
        return;
    }
    println!();
    println!("{:<8} {:<6} {:>6}  {}", "KIND", "PAGES", "CHUNKS", "TITLE");
    for d in &status.documents {
        let pages = d
            .page_count
            .map(|p| p.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{:<8} {:<6} {:>6}  {}",
            d.source_kind.to_string(),
            pages,
            d.chunk_count,
            d.title
        );
    }
}

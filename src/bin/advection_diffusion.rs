use adfem::config::RunConfig;
use adfem::driver::RefinementLoop;
use eyre::WrapErr;
use log::info;
use std::env;
use std::fs;
use std::io::BufWriter;

fn main() -> eyre::Result<()> {
    tracing_subscriber::fmt::init();

    let config = match env::args().nth(1) {
        Some(path) => RunConfig::from_json_file(path)?,
        None => RunConfig::default(),
    };
    info!("Running with configuration {:?}", config);

    let output_dir = config.output_dir.clone();
    let summaries = RefinementLoop::new(config)
        .run()
        .wrap_err("Refinement loop failed")?;

    for summary in &summaries {
        info!(
            "Cycle {}: cells = {}, dofs = {}, nnz = {}, iterations = {}, residual = {:.3e}",
            summary.cycle,
            summary.num_active_cells,
            summary.num_dofs,
            summary.pattern_nnz,
            summary.iterations,
            summary.residual_norm
        );
    }

    if let Some(dir) = output_dir {
        let path = dir.join("summary.json");
        let file = fs::File::create(&path).wrap_err_with(|| format!("Failed to create {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &summaries)
            .wrap_err_with(|| format!("Failed to write {}", path.display()))?;
    }

    Ok(())
}

//! Column-by-column report of an inference run.
//!
//! Scans the input like `infer`, then prints one row per column with the
//! rendered declaration, the variant the column settled on and the
//! statistics that produced it.

use anyhow::{Context, Result};
use log::info;

use crate::{
    cli::InspectArgs,
    infer::{self, SchemaInference},
    options_from_input_args,
    table::{Align, Table},
};

pub fn execute(args: &InspectArgs) -> Result<()> {
    let options = options_from_input_args(&args.source)?;
    let inference = infer::scan(&args.source.input, &options)
        .with_context(|| format!("Scanning {:?}", args.source.input))?;

    if inference.classifiers().is_empty() {
        println!("No columns inferred.");
        return Ok(());
    }

    let table = build_table(&inference)?;
    print!("{}", table.render());
    info!(
        "Inspected {} column(s) over {} row(s)",
        inference.classifiers().len(),
        inference.stats().rows_read
    );
    Ok(())
}

pub fn build_table(inference: &SchemaInference) -> Result<Table> {
    let mut table =
        Table::new(["#", "name", "type", "variant", "details"]).align(0, Align::Right);
    for (idx, classifier) in inference.classifiers().iter().enumerate() {
        let declaration = classifier.render()?;
        table.push_row(vec![
            (idx + 1).to_string(),
            classifier.name().to_string(),
            declaration.to_string(),
            classifier.variant().to_string(),
            classifier.state().describe_stats(),
        ]);
    }
    Ok(table)
}

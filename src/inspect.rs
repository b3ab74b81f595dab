use anyhow::Result;
use log::info;

use crate::{classify::classify, cli::InspectArgs, columns::standardize_columns, dataset, io_utils, render};

pub fn execute(args: &InspectArgs) -> Result<()> {
    let delimiter = io_utils::resolve_input_delimiter(&args.input, args.delimiter);
    let encoding = io_utils::resolve_encoding(args.input_encoding.as_deref())?;
    let table = standardize_columns(dataset::read_csv(&args.input, delimiter, encoding)?);

    let preview = table.head(args.rows);
    println!("Preview of Data (Standardized Columns)");
    print!("{}", render::render_table(&preview.headers(), &preview.display_rows()));
    println!("\nDetected dataset type: {}", classify(&table));
    info!(
        "Displayed {} of {} row(s) from {:?}",
        preview.row_count(),
        table.row_count(),
        args.input
    );
    Ok(())
}

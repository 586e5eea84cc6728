use anyhow::Context;
use clap::*;
use std::io::Write;

use maftc::{MafAli, MafReader, RefSegment, GAP};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("plan")
        .about("Prints the planned comparison order of each block")
        .after_help(
            r###"
For every alignment block, prints the column segments the planner selects
and the reference row assigned to each. The segments always partition the
block's columns: every column belongs to exactly one segment.

Notes:
* Supports both plain text and gzipped (.gz) files
* Reads from stdin if input file is 'stdin'
* By default rows claim segments in ascending gap-count order, the order the
  closure uses; --raw claims in input row order instead
* --matrix marks each row's claimed columns with '*' ('.' unclaimed base,
  '-' gap)

Examples:
1. Show the comparison order of each block:
   maftc plan tests/maf/example.maf

2. Claim in input row order and draw the claim matrix:
   maftc plan tests/maf/example.maf --raw --matrix

"###,
        )
        .arg(
            Arg::new("infiles")
                .required(true)
                .num_args(1..)
                .index(1)
                .help("Input MAF file(s) to process"),
        )
        .arg(
            Arg::new("raw")
                .long("raw")
                .action(ArgAction::SetTrue)
                .help("Claim segments in input row order instead of sorting by gap count"),
        )
        .arg(
            Arg::new("matrix")
                .long("matrix")
                .action(ArgAction::SetTrue)
                .help("Draw each block's claim matrix"),
        )
        .arg(
            Arg::new("outfile")
                .long("outfile")
                .short('o')
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

// command implementation
pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    //----------------------------
    // Args
    //----------------------------
    let mut writer = maftc::writer(args.get_one::<String>("outfile").unwrap());
    let is_raw = args.get_flag("raw");
    let is_matrix = args.get_flag("matrix");

    //----------------------------
    // Ops
    //----------------------------
    let mut index = 0;
    for infile in args.get_many::<String>("infiles").unwrap() {
        for ali in MafReader::new(maftc::reader(infile)) {
            let ali = ali.with_context(|| format!("reading {}", infile))?;

            let segments = if is_raw {
                let rows: Vec<&[u8]> = ali.components.iter().map(|c| c.seq()).collect();
                maftc::comparison_order(&rows)
            } else {
                maftc::plan_block(&ali).with_context(|| format!("block #{}", index))?
            };

            //----------------------------
            // Output
            //----------------------------
            writer.write_all(
                format!(
                    "block #{}: {} rows, {} cols, {} segments\n",
                    index,
                    ali.num_rows(),
                    ali.num_cols(),
                    segments.len()
                )
                .as_ref(),
            )?;
            for seg in &segments {
                writer.write_all(
                    format!(
                        "  ref={} {} [{}, {})\n",
                        seg.ref_row,
                        ali.components[seg.ref_row].src,
                        seg.region.start,
                        seg.region.end
                    )
                    .as_ref(),
                )?;
            }
            if is_matrix {
                write_matrix(&mut writer, &ali, &segments)?;
            }

            index += 1;
        }
    }

    Ok(())
}

/// One line per row: '*' where the row is the claiming reference, '-' on a
/// gap, '.' on a base claimed by some other row.
fn write_matrix(
    writer: &mut Box<dyn Write>,
    ali: &MafAli,
    segments: &[RefSegment],
) -> anyhow::Result<()> {
    let mut col_ref: Vec<Option<usize>> = vec![None; ali.num_cols()];
    for seg in segments {
        for c in seg.region.start..seg.region.end {
            col_ref[c] = Some(seg.ref_row);
        }
    }

    for (ri, comp) in ali.components.iter().enumerate() {
        let mut line = String::with_capacity(ali.num_cols());
        for (c, &base) in comp.seq().iter().enumerate() {
            if col_ref[c] == Some(ri) {
                line.push('*');
            } else if base == GAP {
                line.push('-');
            } else {
                line.push('.');
            }
        }
        writer.write_all(format!("  {} {}\n", line, comp.src).as_ref())?;
    }

    Ok(())
}

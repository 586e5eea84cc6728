use anyhow::Context;
use clap::*;
use std::io::Write;

use maftc::{MafReader, PinchRecorder};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("stat")
        .about("Block and pinch statistics of MAF files")
        .after_help(
            r###"
Plans every block and reports, per block, how much pinching the closure
would issue. No thread set is built; pinch operations are only counted.

Notes:
* Supports both plain text and gzipped (.gz) files
* Reads from stdin if input file is 'stdin'
* --detail adds one line per row with its range and gap count

Examples:
1. Per-block statistics:
   maftc stat tests/maf/example.maf

2. Include per-row detail lines:
   maftc stat tests/maf/example.maf --detail

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
            Arg::new("detail")
                .long("detail")
                .action(ArgAction::SetTrue)
                .help("Add one line per row with its range and gap count"),
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
    let is_detail = args.get_flag("detail");

    //----------------------------
    // Ops
    //----------------------------
    writer.write_all("#block\trows\tcols\tgaps\tsegments\tpinches\tpinched_bases\n".as_ref())?;

    let mut index = 0;
    for infile in args.get_many::<String>("infiles").unwrap() {
        for ali in MafReader::new(maftc::reader(infile)) {
            let ali = ali.with_context(|| format!("reading {}", infile))?;

            let segments = maftc::plan_block(&ali).with_context(|| format!("block #{}", index))?;
            let mut recorder = PinchRecorder::default();
            maftc::issue_pinches(&ali, &segments, &mut recorder)
                .with_context(|| format!("block #{}", index))?;

            let gaps: usize = ali.components.iter().map(|c| c.gap_count()).sum();
            let pinched_bases: i64 = recorder.ops.iter().map(|op| op.length).sum();

            //----------------------------
            // Output
            //----------------------------
            writer.write_all(
                format!(
                    "{}\t{}\t{}\t{}\t{}\t{}\t{}\n",
                    index,
                    ali.num_rows(),
                    ali.num_cols(),
                    gaps,
                    segments.len(),
                    recorder.ops.len(),
                    pinched_bases
                )
                .as_ref(),
            )?;

            if is_detail {
                for comp in &ali.components {
                    let start = comp.positive_start();
                    let mut rg = intspan::Range::from(
                        &comp.src,
                        (start + 1) as i32,
                        (start + comp.size) as i32,
                    );
                    *rg.strand_mut() = comp.strand.to_string();
                    writer.write_all(
                        format!("# {}\tgaps={}\n", rg, comp.gap_count()).as_ref(),
                    )?;
                }
            }

            index += 1;
        }
    }

    Ok(())
}

use anyhow::Context;
use clap::*;

use maftc::libs::registry::reverse_complement;
use maftc::{MafAli, MafComp, MafReader, MafWriter, PinchOp, PinchRecorder, SeqPool, ThreadSet};

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("closure")
        .about("Computes the transitive closure of MAF alignment blocks")
        .after_help(
            r###"
Reads all alignment blocks, unites every pair of bases the blocks assert to
be homologous into a base-level pinch graph, and writes the resulting merged
blocks back out as MAF. Bases related only through a chain of blocks end up
in the same output block without ever being aligned directly.

Notes:
* Supports both plain text and gzipped (.gz) files
* Reads from stdin if input file is 'stdin'
* Sequences are deduplicated by name across all input files; the same name
  must always carry the same source length
* Unaligned stretches are omitted unless --all is given
* Running in parallel mode with 1 reader, 1 writer and the corresponding
  number of workers; workers only plan blocks, all merges are applied by the
  single writer thread

Examples:
1. Close a MAF file over itself:
   maftc closure tests/maf/example.maf

2. Keep unaligned stretches as single-row blocks:
   maftc closure tests/maf/example.maf --all

3. Plan blocks with 4 worker threads:
   maftc closure tests/maf/example.maf --parallel 4

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
            Arg::new("all")
                .long("all")
                .action(ArgAction::SetTrue)
                .help("Also write unmerged single-row runs"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .value_parser(value_parser!(usize))
                .num_args(1)
                .default_value("1")
                .help("Number of threads for planning blocks"),
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
    let opt_parallel = *args.get_one::<usize>("parallel").unwrap();
    let opt_all = args.get_flag("all");

    //----------------------------
    // Ops
    //----------------------------
    // Pass 1 - register every sequence and collect blocks
    let mut pool = SeqPool::new();
    let mut blocks = vec![];
    for infile in args.get_many::<String>("infiles").unwrap() {
        for ali in MafReader::new(maftc::reader(infile)) {
            let ali = ali.with_context(|| format!("reading {}", infile))?;
            for comp in &ali.components {
                pool.fill(comp)?;
            }
            blocks.push(ali);
        }
    }
    let mut thread_set = pool.build_thread_set()?;

    // Pass 2 - plan each block and pinch it into the thread set
    if opt_parallel == 1 {
        for (i, ali) in blocks.iter().enumerate() {
            let segments = maftc::plan_block(ali).with_context(|| format!("block #{}", i))?;
            maftc::issue_pinches(ali, &segments, &mut thread_set)
                .with_context(|| format!("block #{}", i))?;
        }
    } else {
        pinch_blocks_p(&blocks, &mut thread_set, opt_parallel)?;
    }

    //----------------------------
    // Output
    //----------------------------
    let writer = maftc::writer(args.get_one::<String>("outfile").unwrap());
    let mut maf_writer = MafWriter::new(writer);
    maf_writer.write_header("maftc")?;

    let min_rows = if opt_all { 1 } else { 2 };
    for block in thread_set.merged_blocks(min_rows) {
        let mut ali = MafAli::default();
        for member in &block.members {
            let thread = thread_set.thread(member.thread).unwrap();
            let seq = pool.get(&thread.name).unwrap();

            let start = member.start as usize;
            let length = member.length as usize;
            let bases = &seq.bases()[start..start + length];
            let (text, strand, maf_start) = if member.forward {
                (String::from_utf8_lossy(bases).to_string(), '+', start)
            } else {
                (
                    String::from_utf8_lossy(&reverse_complement(bases)).to_string(),
                    '-',
                    seq.length - (start + length),
                )
            };

            ali.components.push(MafComp {
                src: thread.name.clone(),
                start: maf_start,
                size: length,
                strand,
                src_size: seq.length,
                text,
            });
        }
        maf_writer.write_ali(&ali)?;
    }

    Ok(())
}

// Adopt from https://rust-lang-nursery.github.io/rust-cookbook/concurrency/threads.html#create-a-parallel-pipeline
fn pinch_blocks_p(
    blocks: &[MafAli],
    thread_set: &mut ThreadSet,
    parallel: usize,
) -> anyhow::Result<()> {
    // Channel 1 - block indexes to plan
    let (snd1, rcv1) = crossbeam::channel::bounded::<usize>(10);
    // Channel 2 - recorded pinch operations
    let (snd2, rcv2) = crossbeam::channel::bounded::<Vec<PinchOp>>(10);

    crossbeam::scope(|s| {
        //----------------------------
        // Reader thread
        //----------------------------
        s.spawn(|_| {
            for i in 0..blocks.len() {
                snd1.send(i).unwrap();
            }
            // Close the channel - this is necessary to exit the for-loop in the worker
            drop(snd1);
        });

        //----------------------------
        // Worker threads
        //----------------------------
        for _ in 0..parallel {
            // Send to sink, receive from source
            let (sendr, recvr) = (snd2.clone(), rcv1.clone());
            // Spawn workers in separate threads
            s.spawn(move |_| {
                // Receive until channel closes
                for i in recvr.iter() {
                    let segments = maftc::plan_block(&blocks[i]).unwrap();
                    let mut recorder = PinchRecorder::default();
                    maftc::issue_pinches(&blocks[i], &segments, &mut recorder).unwrap();
                    sendr.send(recorder.ops).unwrap();
                }
            });
        }
        // Close the channel, otherwise sink will never exit the for-loop
        drop(snd2);

        //----------------------------
        // Sink - merges are the sole shared-mutable resource, applied here
        //----------------------------
        for ops in rcv2.iter() {
            for op in ops {
                thread_set
                    .merge_ranges(&op.a, op.a_start, &op.b, op.b_start, op.length, op.same_strand)
                    .unwrap();
            }
        }
    })
    .unwrap();

    Ok(())
}

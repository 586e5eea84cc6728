extern crate clap;
use clap::*;

mod cmd_maftc;

fn main() -> anyhow::Result<()> {
    let app = Command::new("maftc")
        .version(crate_version!())
        .about("`maftc` computes the transitive closure of MAF alignments")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_maftc::closure::make_subcommand())
        .subcommand(cmd_maftc::plan::make_subcommand())
        .subcommand(cmd_maftc::stat::make_subcommand())
        .after_help(
            r###"
Aligned bases asserted to be homologous, directly or through a chain of
blocks, end up in the same node of a base-level pinch graph.

Subcommand groups:

* info: stat
* inspection: plan
* computation: closure

"###,
        );

    // Check which subcommand the user ran...
    match app.get_matches().subcommand() {
        // info
        Some(("stat", sub_matches)) => cmd_maftc::stat::execute(sub_matches),
        // inspection
        Some(("plan", sub_matches)) => cmd_maftc::plan::execute(sub_matches),
        // computation
        Some(("closure", sub_matches)) => cmd_maftc::closure::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}

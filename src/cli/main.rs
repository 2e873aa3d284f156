use peak_alloc::PeakAlloc;
use pico_args::Arguments;
use sinkalign::cli::config::ConfigOverrides;
use sinkalign::cli::workflows::align_pair::{align_pair, DEFAULT_PRINT_FREQ, HELP_ALIGN};
use sinkalign::cli::workflows::batch::{batch, HELP_BATCH};
use sinkalign::cli::*;
use sinkalign::prelude::*;

#[global_allocator]
static PEAK_ALLOC: PeakAlloc = PeakAlloc;

const HELP: &str = "\
usage: sinkalign <command> [OPTIONS]

commands:
 align     Align a mobile structure onto a reference structure
 batch     Align every pair of a pair list, over one or more distance cutoffs

options:
 -h, --help                       Print this help menu

Run `sinkalign <command> --help` for the options of each command.
";

fn parse_overrides(args: &mut Arguments) -> Result<ConfigOverrides, pico_args::Error> {
    Ok(ConfigOverrides {
        steps: args.opt_value_from_str(["-s", "--steps"])?,
        learning_rate: args.opt_value_from_str(["-l", "--lr"])?,
        weight_decay: args.opt_value_from_str("--weight-decay")?,
        epsilon: args.opt_value_from_str("--epsilon")?,
        gamma: args.opt_value_from_str("--gamma")?,
        sinkhorn_iterations: args.opt_value_from_str("--sinkhorn-iters")?,
        d0: args.opt_value_from_str("--d0")?,
        cutoff: args.opt_value_from_str("--cutoff")?,
        no_cutoff: args.contains("--no-cutoff"),
        steepness: args.opt_value_from_str("--steepness")?,
        seed: args.opt_value_from_str("--seed")?,
        init_noise: args.opt_value_from_str("--init-noise")?,
        patience: args.opt_value_from_str("--patience")?,
        tolerance: args.opt_value_from_str("--tolerance")?,
        max_residues: args.opt_value_from_str("--max-residues")?,
    })
}

fn parse_arg() -> Result<AppArgs, Box<dyn std::error::Error>> {
    let mut args = Arguments::from_env();
    let parsed = match args.subcommand()?.as_deref() {
        Some("align") => AppArgs::Align {
            mobile: args.opt_value_from_str(["-m", "--mobile"])?,
            reference: args.opt_value_from_str(["-r", "--reference"])?,
            mobile_chain: args.opt_value_from_str("--mobile-chain")?,
            reference_chain: args.opt_value_from_str("--reference-chain")?,
            output: args.opt_value_from_str(["-o", "--output"])?,
            matrix_out: args.opt_value_from_str("--matrix-out")?,
            report: args.opt_value_from_str("--report")?,
            config: args.opt_value_from_str(["-c", "--config"])?,
            save_config: args.opt_value_from_str("--save-config")?,
            overrides: parse_overrides(&mut args)?,
            print_freq: args.opt_value_from_str("--print-freq")?.unwrap_or(DEFAULT_PRINT_FREQ),
            verbose: args.contains(["-v", "--verbose"]),
            help: args.contains(["-h", "--help"]),
        },
        Some("batch") => AppArgs::Batch {
            pair_list: args.opt_value_from_str(["-p", "--pairs"])?,
            structure_dir: args.opt_value_from_str(["-d", "--structures"])?,
            output_dir: args.opt_value_from_str(["-o", "--output"])?,
            cutoffs: args.opt_value_from_str("--cutoffs")?,
            threads: args.opt_value_from_str(["-t", "--threads"])?.unwrap_or(1),
            fail_fast: args.contains("--fail-fast"),
            config: args.opt_value_from_str(["-c", "--config"])?,
            save_config: args.contains("--save-config"),
            overrides: parse_overrides(&mut args)?,
            verbose: args.contains(["-v", "--verbose"]),
            help: args.contains(["-h", "--help"]),
        },
        Some(other) => return Err(format!("Invalid subcommand: {}", other).into()),
        None => AppArgs::Global {
            help: args.contains(["-h", "--help"]),
        },
    };
    let remaining = args.finish();
    if !remaining.is_empty() {
        print_log_msg(WARN, &format!("Unused arguments: {:?}", remaining));
    }
    Ok(parsed)
}

fn main() {
    let parsed_args = parse_arg().unwrap_or_else(|e| {
        print_log_msg(FAIL, &format!("{}", e));
        std::process::exit(1);
    });
    match parsed_args {
        AppArgs::Global { help } => {
            print_logo();
            eprintln!("{}", HELP);
            if !help {
                std::process::exit(1);
            }
        }
        AppArgs::Align { help: true, .. } => {
            eprintln!("{}", HELP_ALIGN);
        }
        AppArgs::Batch { help: true, .. } => {
            eprintln!("{}", HELP_BATCH);
        }
        align_args @ AppArgs::Align { .. } => align_pair(align_args),
        batch_args @ AppArgs::Batch { .. } => batch(batch_args, &PEAK_ALLOC),
    }
}

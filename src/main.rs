#[cfg(not(feature = "convert"))]
fn main() {
    eprintln!(
        "The sound-copro CLI requires the \"convert\" feature. Rebuild with `--features convert`."
    );
}

#[cfg(feature = "convert")]
mod cli {
    use std::env;
    use std::fs;

    use anyhow::{bail, Context, Result};
    use sound_copro::codec::layout;
    use sound_copro::{pad_to_boundary, raw_from_wav, DriverVariant, SoundConfig, TargetFormat};
    use tracing_subscriber::filter::LevelFilter;
    use tracing_subscriber::util::SubscriberInitExt;

    const USAGE: &str = "Usage:
  sound-copro prepare <in.wav> <out.raw> [--driver <name>] [--rate <hz>]
  sound-copro layout [--config <file>]

Commands:
  prepare    Convert a WAV file to raw driver sample data, padded to the driver's block size
  layout     Print the register window map and driver variants

Flags:
  --driver <name>    Target driver: pcm, 2adpcm, 4pcm (default), 4pcm-env
  --rate <hz>        Output rate (single channel PCM only: 32000, 22050, 16000, 13400, 11025, 8000)
  --config <file>    JSON configuration file (layout)
  -v, --verbose      Debug logging
  -h, --help         Show this help
";

    #[derive(Debug, Default)]
    struct Args {
        command: Option<String>,
        positional: Vec<String>,
        driver: Option<String>,
        rate: Option<u32>,
        config: Option<String>,
        verbose: bool,
        help: bool,
    }

    fn parse_args() -> Result<Args> {
        let mut parsed = Args::default();
        let mut args = env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--help" | "-h" => parsed.help = true,
                "--verbose" | "-v" => parsed.verbose = true,
                "--driver" => {
                    parsed.driver = Some(args.next().context("--driver requires a name")?);
                }
                "--rate" => {
                    let value = args.next().context("--rate requires a frequency")?;
                    parsed.rate = Some(
                        value
                            .parse()
                            .with_context(|| format!("invalid rate: {value}"))?,
                    );
                }
                "--config" => {
                    parsed.config = Some(args.next().context("--config requires a path")?);
                }
                _ if arg.starts_with('-') => bail!("unknown flag: {arg}"),
                _ if parsed.command.is_none() => parsed.command = Some(arg),
                _ => parsed.positional.push(arg),
            }
        }
        Ok(parsed)
    }

    fn init_logging(verbose: bool) {
        let level = if verbose {
            LevelFilter::DEBUG
        } else {
            LevelFilter::WARN
        };
        tracing_subscriber::fmt()
            .with_max_level(level)
            .compact()
            .finish()
            .init();
    }

    fn load_config(path: Option<&str>) -> Result<SoundConfig> {
        match path {
            Some(path) => SoundConfig::from_path(path)
                .with_context(|| format!("failed to load config '{path}'")),
            None => Ok(SoundConfig::default()),
        }
    }

    fn prepare(args: &Args) -> Result<()> {
        let [input, output] = args.positional.as_slice() else {
            bail!("prepare takes <in.wav> <out.raw>\n\n{USAGE}");
        };

        let name = args.driver.as_deref().unwrap_or("4pcm");
        let variant = DriverVariant::from_name(name)
            .with_context(|| format!("unknown driver: {name}"))?;
        let target = TargetFormat::for_variant(variant, args.rate)?;

        let mut data = raw_from_wav(input, target)
            .with_context(|| format!("failed to convert '{input}'"))?;
        let raw_len = data.len();
        if let Some(boundary) = variant.boundary() {
            pad_to_boundary(&mut data, boundary, target.silence());
        }
        fs::write(output, &data).with_context(|| format!("failed to write '{output}'"))?;

        println!(
            "{input} -> {output}: {} bytes ({} Hz, {} driver, {} bytes padding)",
            data.len(),
            target.rate,
            variant,
            data.len() - raw_len
        );
        Ok(())
    }

    fn print_layout(args: &Args) -> Result<()> {
        let config = load_config(args.config.as_deref())?;

        println!("Register window");
        println!("===============");
        println!("  {:#06X}  command (play pulse bit per channel)", layout::COMMAND);
        println!("  {:#06X}  status (playing bits, bit 7 ready)", layout::STATUS);
        println!("  {:#06X}  loop bits", layout::LOOP_STATUS);
        for ch in 0..4 {
            println!(
                "  {:#06X}  channel {} parameters   {:#06X}  channel {} internal",
                layout::channel_params(ch),
                ch,
                layout::internal_params(ch),
                ch
            );
        }
        println!("  {:#06X}  pcm rate code", layout::PCM_RATE);
        println!("  {:#06X}  pcm pan", layout::PCM_PAN);
        println!("  {:#06X}  envelope volume (1 byte per channel)", layout::VOLUME);
        println!("  {:#06X}  tracker A song address (3 bytes)", layout::MVS_SONG);
        println!("  {:#06X}  tracker A play mode", layout::MVS_MODE);
        println!("  {:#06X}  tracker B song address (4 bytes)", layout::TFM_SONG);

        println!("\nDrivers");
        println!("=======");
        for variant in DriverVariant::ALL {
            let boundary = variant
                .boundary()
                .map_or_else(|| "-".to_string(), |b| format!("{b} B"));
            println!(
                "  {}  {:<9} channels: {}  block: {:<6} volume: {}",
                variant.id(),
                variant.name(),
                variant.channel_count(),
                boundary,
                if variant.has_volume() { "yes" } else { "no" }
            );
        }

        println!("\nNull samples");
        println!("============");
        println!("  8-bit PCM  {:#010X}", config.null_samples.pcm_address);
        println!("  4-bit ADPCM  {:#010X}", config.null_samples.adpcm_address);
        Ok(())
    }

    pub fn run() -> Result<()> {
        let args = parse_args()?;
        init_logging(args.verbose);

        match args.command.as_deref() {
            _ if args.help => {
                print!("{USAGE}");
                Ok(())
            }
            Some("prepare") => prepare(&args),
            Some("layout") => print_layout(&args),
            Some(other) => bail!("unknown command: {other}\n\n{USAGE}"),
            None => {
                eprint!("{USAGE}");
                Ok(())
            }
        }
    }
}

#[cfg(feature = "convert")]
fn main() -> anyhow::Result<()> {
    cli::run()
}

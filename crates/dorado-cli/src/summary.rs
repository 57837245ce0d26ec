use console::Style;
use dorado_core::analysis::Fournax;
use dorado_core::filter::Filter;
use dorado_core::pipeline::config::ReductionConfig;
use dorado_core::pipeline::StageReport;
use dorado_core::timeseries::TimeSeries;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    disabled: Style,
    warning: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            disabled: Style::new().dim().yellow(),
            warning: Style::new().yellow(),
            path: Style::new().underlined(),
        }
    }
}

fn rule(s: &Styles, len: usize) {
    println!("  {}", s.title.apply_to("\u{2550}".repeat(len)));
}

pub struct ReduceSummary<'a> {
    pub night: &'a std::path::Path,
    pub filter: Filter,
    pub target: &'a str,
    pub lights: usize,
    pub bias: usize,
    pub flats: usize,
    pub differential: bool,
}

pub fn print_reduce_summary(info: &ReduceSummary<'_>, config: &ReductionConfig) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Dorado Reduction"));
    rule(&s, 16);
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Night"),
        s.path.apply_to(info.night.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Target"),
        s.value.apply_to(info.target)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Filter"),
        s.method.apply_to(info.filter)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Frames"),
        s.value.apply_to(format!(
            "{} lights, {} bias, {} flats",
            info.lights, info.bias, info.flats
        ))
    );
    println!();

    println!("  {}", s.header.apply_to("Calibration"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Failures"),
        s.method.apply_to(config.calibration.failure_policy)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Flat"),
        s.value.apply_to(if config.calibration.normalize_flat {
            "normalized"
        } else {
            "raw"
        })
    );
    println!();

    println!("  {}", s.header.apply_to("Photometry"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("PSF sigma"),
        s.value.apply_to(format!("{} px", config.photometry.psf_sigma))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Fit shape"),
        s.value.apply_to(format!("{0}x{0} px", config.photometry.fit_shape))
    );
    if info.differential {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Mode"),
            s.method.apply_to("differential")
        );
    } else {
        println!(
            "    {:<12}{}",
            s.label.apply_to("Mode"),
            s.disabled.apply_to("absolute (no control star)")
        );
    }
    println!();
}

pub fn print_reports(reports: &[StageReport]) {
    let s = Styles::new();

    println!("  {}", s.header.apply_to("Stages"));
    for report in reports {
        let line = format!("{report}");
        if report.is_complete() {
            println!("    {}", s.value.apply_to(line));
        } else {
            println!("    {}", s.warning.apply_to(line));
        }
    }
    println!();
}

pub fn print_analysis(fournax: &Fournax, filter: Filter, ts: &TimeSeries) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to(format!("Period Analysis: {}", fournax.target().name())));
    rule(&s, 17 + fournax.target().name().len());
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Filter"),
        s.method.apply_to(filter)
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Samples"),
        s.value.apply_to(format!("{} raw, {} fitted", ts.len(), ts.fit_flux.len()))
    );
    let eph = fournax.ephemeris();
    if let (Some(epoch), Some(period)) = (eph.epoch, eph.period) {
        println!(
            "  {:<14}{}",
            s.label.apply_to("Ephemeris"),
            s.value.apply_to(format!("{epoch:.5} + {period:.7} E"))
        );
    }
    println!();

    if ts.toml.is_empty() {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Maxima"),
            s.disabled.apply_to("none")
        );
    } else {
        println!("  {}", s.header.apply_to("Maxima"));
        println!(
            "    {:<16}{:>8}{:>12}",
            s.label.apply_to("Time (MJD)"),
            s.label.apply_to("E"),
            s.label.apply_to("O-C (d)")
        );
        for ((t, e), omc) in ts.toml.iter().zip(&ts.cycle).zip(&ts.omc) {
            println!(
                "    {:<16}{:>8}{:>12}",
                s.value.apply_to(format!("{t:.5}")),
                s.value.apply_to(e),
                s.value.apply_to(format!("{omc:+.5}"))
            );
        }
    }
    println!();

    if fournax.freq().is_empty() {
        println!(
            "  {:<14}{}",
            s.header.apply_to("Frequencies"),
            s.disabled.apply_to("none")
        );
    } else {
        println!("  {}", s.header.apply_to("Frequencies"));
        for (i, f) in fournax.freq().iter().take(5).enumerate() {
            println!(
                "    {}. {} {}",
                s.label.apply_to(i + 1),
                s.value.apply_to(format!("{f:.5} c/d")),
                s.label.apply_to(format!("(P = {:.5} d)", 1.0 / f))
            );
        }
    }
    println!();
}

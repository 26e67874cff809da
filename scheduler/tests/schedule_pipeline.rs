use anyhow::Result;
use perfmux_scheduler::workspace;
use perfmux_scheduler::ScheduleConfig;
use perfmux_shared::types::arch::ArchitectureProfile;
use perfmux_shared::types::spec::Directives;
use perfmux_shared::utils::paths;
use std::fs;
use std::path::Path;

fn write_definitions(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir.join("mi200"))?;
    fs::write(
        dir.join("pmc_sq_perf.txt"),
        "\
# wavefront counters
pmc: SQ_WAVES SQ_BUSY_CYCLES SQ_INSTS_VALU SQ_INSTS_SALU SQ_INSTS_SMEM
pmc: SQ_LEVEL_WAVES SQ_ACCUM_PREV_HIRES
pmc: SQ_INSTS_LDS SQ_INSTS_FLAT SQ_WAIT_INST_ANY SQC_ICACHE_HITS
kernel: gemm
",
    )?;
    fs::write(
        dir.join("pmc_tcc_perf.txt"),
        "pmc: TCC_HIT_sum TCC_MISS_sum\npmc: TCC_HIT[0] TCC_HIT[1]\n",
    )?;
    fs::write(
        dir.join("mi200/pmc_ta_perf.txt"),
        "pmc: TA_BUSY_avr TA_FLAT_READ_WAVEFRONTS_sum TA_TA_BUSY_sum\n",
    )?;
    Ok(())
}

#[test]
fn test_schedule_run_writes_spec_and_levels() -> Result<()> {
    let defs = tempfile::tempdir()?;
    let workload = tempfile::tempdir()?;
    write_definitions(defs.path())?;

    let profile = ArchitectureProfile::builtin("mi200")?;
    let config = ScheduleConfig::default();
    let summary = workspace::run(workload.path(), defs.path(), &config, &profile)?;

    // 9 SQ counters at capacity 8 -> 2 passes; TCC 1 aggregated + 1 channel pass -> 2
    assert_eq!(summary.passes, 2);
    assert_eq!(summary.counters, 16);
    assert_eq!(summary.levels.len(), 1);
    assert_eq!(
        summary.levels[0].line.as_deref(),
        Some("pmc: SQ_LEVEL_WAVES SQ_ACCUM_PREV_HIRES")
    );

    let spec = fs::read_to_string(paths::scheduled_spec_path(workload.path()))?;
    let lines: Vec<&str> = spec.lines().collect();
    assert_eq!(
        lines[0],
        "pmc: SQ_WAVES SQ_BUSY_CYCLES SQ_INSTS_VALU SQ_INSTS_SALU SQ_INSTS_SMEM SQ_INSTS_LDS \
SQ_INSTS_FLAT SQ_WAIT_INST_ANY TA_BUSY_avr TA_FLAT_READ_WAVEFRONTS_sum TCC_HIT_sum TCC_MISS_sum"
    );
    assert_eq!(lines[1], "pmc: SQC_ICACHE_HITS TA_TA_BUSY_sum TCC_HIT[0] TCC_HIT[1]");
    assert_eq!(&lines[2..], &["", "gpu:", "range:", "kernel: gemm"]);

    let level = fs::read_to_string(paths::level_spec_path(workload.path(), "SQ_LEVEL_WAVES"))?;
    assert!(level.starts_with("pmc: SQ_LEVEL_WAVES SQ_ACCUM_PREV_HIRES\n"));

    Ok(())
}

#[test]
fn test_schedule_run_isolated_lines_with_overrides() -> Result<()> {
    let defs = tempfile::tempdir()?;
    let workload = tempfile::tempdir()?;
    write_definitions(defs.path())?;

    let profile = ArchitectureProfile::builtin("mi200")?;
    let config = ScheduleConfig {
        isolate_lines: true,
        directives: Directives {
            gpu: Some("1".to_string()),
            ..Default::default()
        },
        ..Default::default()
    };
    let summary = workspace::run(workload.path(), defs.path(), &config, &profile)?;

    assert!(!paths::scheduled_spec_path(workload.path()).exists());
    let first = fs::read_to_string(paths::pass_spec_path(workload.path(), 0))?;
    let second = fs::read_to_string(paths::pass_spec_path(workload.path(), 1))?;
    assert!(first.ends_with("\n\ngpu: 1\nrange:\nkernel: gemm\n"));
    assert!(second.starts_with("pmc: SQC_ICACHE_HITS"));
    assert!(summary.written.contains(&paths::pass_spec_path(workload.path(), 1)));

    Ok(())
}

#[test]
fn test_schedule_run_ip_block_filter() -> Result<()> {
    let defs = tempfile::tempdir()?;
    let workload = tempfile::tempdir()?;
    write_definitions(defs.path())?;

    let profile = ArchitectureProfile::builtin("mi200")?;
    let config = ScheduleConfig {
        ip_blocks: Some(vec!["ta".to_string()]),
        ..Default::default()
    };
    let summary = workspace::run(workload.path(), defs.path(), &config, &profile)?;
    assert_eq!(summary.counters, 3);
    // TA capacity 2
    assert_eq!(summary.passes, 2);

    Ok(())
}

#[test]
fn test_configuration_error_writes_nothing() -> Result<()> {
    let defs = tempfile::tempdir()?;
    let workload = tempfile::tempdir()?;
    fs::write(defs.path().join("pmc_bad_perf.txt"), "pmc: SQ_WAVES XYZ_UNKNOWN\n")?;

    let profile = ArchitectureProfile::builtin("mi100")?;
    let result = workspace::run(workload.path(), defs.path(), &ScheduleConfig::default(), &profile);

    assert!(result.is_err());
    assert!(!paths::perfmon_dir(workload.path()).exists());
    Ok(())
}

use clap::Parser;
use fare_route_common::{columns, grid, station};
use fare_route_rust::{cli, config, error, export, input, proxy};
use cli::{Cli, Commands};
use config::Config;
use error::Result;
use std::path::PathBuf;

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn write_json_output<T: serde::Serialize>(value: &T, output: Option<&PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, json)?;
            println!("✔ 저장: {}", path.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    run(cli).await?;
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;

    match cli.command {
        Commands::Grid { input, selected, strategy, output } => {
            let results = input::read_route_results(&input)?;
            let selected = input::read_selection(selected.as_deref())?;
            let strategy = strategy.unwrap_or(config.default_strategy);

            let rows = grid::project_rows(&results, &selected, strategy);
            tracing::info!(rows = rows.len(), strategy = %strategy, "그리드 변환 완료");
            write_json_output(&rows, output.as_ref())?;
        }

        Commands::Stations { input, strategy } => {
            let results = input::read_route_results(&input)?;
            let strategy = strategy.unwrap_or(config.default_strategy);
            let rows = grid::project_rows(&results, &[], strategy);
            let summaries = grid::summarize_groups(&rows);

            println!("🚉 경로 그룹 {}개 (결과 {}건, {})\n", summaries.len(), rows.len(), strategy);
            for summary in &summaries {
                println!(
                    "[{}] {} ({}건, 이용 {}회)",
                    summary.group_no, summary.main_stations, summary.row_count, summary.total_cnt
                );
            }

            if cli.verbose {
                println!();
                for row in &rows {
                    let waypoints = station::path_waypoints(&row.path_nm);
                    let collapsed = station::collapse_consecutive(waypoints.clone());
                    println!(
                        "  {} 그룹 {}: 경유 {}개 (연속 중복 제외 {}개)",
                        row.id, row.group_no, waypoints.len(), collapsed.len()
                    );
                }
            }
        }

        Commands::Columns { input, output } => {
            let rows = input::read_rows(&input)?;
            let plan = columns::plan_columns(&rows);
            let totals = columns::side_totals(&rows, &plan);

            if output.is_none() {
                println!("📊 고정 컬럼 {}개, 기관 {}곳\n", plan.fixed.len(), plan.agencies.len());
                for t in &totals {
                    println!("  {}: 지급 {} / 수급 {} (차액 {})", t.agency, t.pay, t.receive, t.balance());
                }
                println!();
            }

            let report = serde_json::json!({
                "columns": plan.to_tree(),
                "fields": plan.fields(),
                "totals": totals,
            });
            write_json_output(&report, output.as_ref())?;
        }

        Commands::Export { input, selected, strategy, output, title } => {
            println!("📄 fare-route - Excel 내보내기\n");

            let results = input::read_route_results(&input)?;
            let selected = input::read_selection(selected.as_deref())?;
            let strategy = strategy.unwrap_or(config.default_strategy);
            println!("✔ 경로 검색 결과 {}건", results.len());

            let rows = grid::project_rows(&results, &selected, strategy);
            let output_dir = output.unwrap_or_else(|| PathBuf::from("."));
            let path = export::export_grid_excel(&rows, &output_dir, &title)?;
            println!("✔ Excel 출력: {}", path.display());
        }

        Commands::Serve { bind, upstream } => {
            proxy::serve(&config, bind, upstream).await?;
        }

        Commands::Config { set_upstream, show } => {
            let mut config = config;

            if let Some(url) = set_upstream {
                config.set_upstream(url)?;
                println!("✔ 업스트림 주소를 설정했습니다");
            }

            if show {
                println!("설정:");
                println!(
                    "  업스트림: {}",
                    config.upstream_url().unwrap_or_else(|_| "미설정".into())
                );
                println!("  바인드 주소: {}", config.bind_addr);
                println!("  세션 만료: {}분", config.session_ttl_minutes);
                println!("  타임아웃: {}초", config.timeout_seconds);
                println!("  기본 그룹 방식: {}", config.default_strategy);
            }
        }
    }

    Ok(())
}

use anyhow::Context;
use dart_statement_analyzer::{
    format_amount, AnalysisOrchestrator, AnalysisReport, AnalyzerConfig, CompanyRegistry,
    FinancialPipeline, GeminiClient, MetricName, OpenDartClient,
};
use dotenv::dotenv;
use std::env;
use std::fs::File;
use std::io::Write;
use std::sync::Arc;

// Usage: analyze_company <corp_code> [year] [registry.json]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    println!("🚀 Starting DART statement analysis...");

    let mut args = env::args().skip(1);
    let corp_code = args.next().unwrap_or_else(|| "00126380".to_string());
    let year: i32 = match args.next() {
        Some(year) => year.parse().context("year must be a number")?,
        None => 2023,
    };
    let registry_path = args.next().unwrap_or_else(|| "corp_codes.json".to_string());

    let config = AnalyzerConfig::from_env();

    let registry = CompanyRegistry::from_path(&registry_path)
        .with_context(|| format!("failed to load company registry from {}", registry_path))?;
    println!("📋 Loaded {} companies from {}", registry.len(), registry_path);

    let source = OpenDartClient::from_config(&config)?;

    let orchestrator = if config.ai_configured() {
        let client = GeminiClient::from_config(&config)?.with_structured_output()?;
        println!("🤖 AI analysis enabled with {}", client.model());
        AnalysisOrchestrator::with_generator(client)
    } else {
        AnalysisOrchestrator::disabled()
    };

    let pipeline = FinancialPipeline::new(Arc::new(source), Arc::new(registry), orchestrator);

    let data = pipeline.get_financial_data(&corp_code, year).await?;
    println!(
        "📥 {} {}: {} line items ({} balance sheet, {} income statement)",
        data.company.corp_name,
        year,
        data.summary.total_items,
        data.summary.balance_sheet_items,
        data.summary.income_statement_items
    );

    for name in MetricName::ALL {
        if let Some(metric) = data.key_metrics.get(name) {
            println!(
                "   {:<8} {:>20} ({:+.1}%)",
                name.label(),
                format_amount(metric.current),
                metric.change_rate
            );
        }
    }
    println!(
        "   부채비율 {:.1}% | 영업이익률 {:.1}% | 순이익률 {:.1}%",
        data.key_metrics.ratios.debt_ratio,
        data.key_metrics.ratios.operating_margin,
        data.key_metrics.ratios.net_margin
    );

    let status = pipeline.ai_status();
    if !status.enabled {
        println!("⚠️  {}", status.message);
        return Ok(());
    }

    println!("🔄 Requesting AI analysis (this usually takes 10-30 seconds)...");
    let report = match pipeline.get_ai_analysis(&corp_code, year).await {
        Ok(report) => report,
        Err(failure) if failure.is_retryable() => {
            eprintln!("❌ {} ({})", failure.message, failure.source);
            return Ok(());
        }
        Err(failure) => return Err(failure.into()),
    };

    match &report {
        AnalysisReport::Structured(structured) => {
            println!("✅ Overall score: {:.1} / 5.0", structured.overall_score);
            println!("   {}", structured.summary);
        }
        AnalysisReport::Raw(raw) => {
            println!("⚠️  Could not parse the answer ({}); showing raw text:", raw.reason);
            println!("{}", raw.summary);
        }
    }

    let filename = format!("analysis_{}_{}.json", data.company.corp_code, year);
    let mut file = File::create(&filename)?;
    writeln!(file, "{}", serde_json::to_string_pretty(&report)?)?;
    println!("💾 Analysis saved to {}", filename);

    Ok(())
}

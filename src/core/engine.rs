use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct ScanEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> ScanEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting catalog scan...");

        tracing::info!("Reading inventory...");
        let inventory = self.pipeline.extract().await?;
        tracing::info!(
            "Read {} time points across {} files",
            inventory.time_rows.len(),
            inventory.files.len()
        );
        self.monitor.log_stats("extract");

        tracing::info!("Building dataset description...");
        let output = self.pipeline.transform(inventory).await?;
        tracing::info!(
            "Described {} variables over {} time values",
            output.variables,
            output.time_values
        );
        self.monitor.log_stats("transform");

        tracing::info!("Writing catalog...");
        let path = self.pipeline.load(output).await?;
        tracing::info!("Catalog saved to: {}", path);
        self.monitor.log_final_stats();

        Ok(path)
    }
}

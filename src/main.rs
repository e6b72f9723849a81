use anyhow::Result;
use answer_sheet_grader::utils::logging;
use answer_sheet_grader::{App, Config, Recognizers, SidecarRecognizer};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // 加载配置
    let config = Config::from_env();

    // 初始化日志
    logging::init(config.verbose_logging);

    // 识别结果从图片旁的 sidecar 文件读取
    let sidecar = Arc::new(SidecarRecognizer);
    let recognizers = Recognizers::new(sidecar.clone(), sidecar, config.recognizer_timeout());

    // 初始化并运行应用
    App::initialize(config, recognizers).await?.run().await?;

    Ok(())
}

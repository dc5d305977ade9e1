//! Interactive alarm console.
//!
//! Reads commands from stdin and drives the engine until EOF or Ctrl-C:
//!
//! ```text
//! Start_Alarm(1): 10 tea is ready
//! Replace_Alarm(1): 20 more steeping
//! Cancel_Alarm(1)
//! ```

use std::sync::Arc;

use tokio::io::BufReader;

use alarmvisor::{AlarmEngine, EngineConfig, LineSource, LogSink};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let engine = AlarmEngine::new(EngineConfig::default(), vec![Arc::new(LogSink)]);
    let mut source = LineSource::new(BufReader::new(tokio::io::stdin()));

    engine.run(&mut source).await?;
    Ok(())
}

use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    gcim_intake::init_tracing();

    match gcim_intake::run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

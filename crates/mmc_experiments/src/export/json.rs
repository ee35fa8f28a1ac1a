use serde::Serialize;

pub(crate) fn export_to_json_impl<T: Serialize>(
    rows: &[T],
    file: std::fs::File,
) -> Result<(), Box<dyn std::error::Error>> {
    serde_json::to_writer_pretty(file, rows)?;
    Ok(())
}

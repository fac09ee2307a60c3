use crate::api::AtencionApi;
use crate::app::MSG_REPORT_SENT;
use crate::error::Result;
use crate::range::DateRange;

pub fn run(api: &dyn AtencionApi, range: &DateRange) -> Result<()> {
    let query = range.query()?;
    api.send_report(&query)?;
    println!("{MSG_REPORT_SENT}");
    Ok(())
}

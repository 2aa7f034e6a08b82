/// Central parser registration module
///
/// Every built-in parser is listed here once. When adding a new parser:
/// 1. Create the parser file under `parsers/` (e.g. `parsers/uptime.rs`)
/// 2. Declare it below with `pub mod uptime;`
/// 3. Add it to `all_parsers()`
///
/// The registry itself never changes when a parser is added.
use crate::base_parser::{streaming, Entrypoint};
use tracing::debug;

pub mod asciitable;
pub mod asciitable_m;
pub mod csv;
pub mod datetime_iso;
pub mod free;
pub mod ip_address;
pub mod ip_route;
pub mod lsblk;
pub mod ping;
pub mod proc;
pub mod swapon;

/// Build a `Vec<Entrypoint>` from batch parsers and `streaming(..)` wrappers.
#[macro_export]
macro_rules! register_parsers {
    ($($parser:expr),* $(,)?) => {
        vec![
            $($crate::base_parser::Entrypoint::from($parser)),*
        ]
    };
}

/// Returns every built-in parser in registration order.
///
/// Registration order breaks ties between magic commands of equal length.
/// Streaming parsers are wrapped with [`streaming`]:
///
/// ```rust,ignore
/// register_parsers![
///     free::FreeParser,
///     streaming(ping::PingStreamParser),
/// ]
/// ```
pub fn all_parsers() -> Vec<Entrypoint> {
    debug!("Collecting built-in parsers");

    let mut parsers = register_parsers![
        asciitable::AsciiTableParser,
        asciitable_m::AsciiTableMultiParser,
        csv::CsvParser,
        streaming(csv::CsvStreamParser),
        datetime_iso::DatetimeIsoParser,
        datetime_iso::IsoDatetimeParser,
        free::FreeParser,
        ip_address::IpAddressParser,
        ip_route::IpRouteParser,
        lsblk::LsblkParser,
        ping::PingParser,
        streaming(ping::PingStreamParser),
        proc::ProcParser,
        swapon::SwaponParser,
    ];
    parsers.extend(proc::sub_parsers());
    parsers
}

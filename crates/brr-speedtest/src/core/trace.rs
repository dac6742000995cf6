use std::collections::HashMap;

use once_cell::sync::Lazy;

/// Known points of presence by IATA code.
static COLO_CITIES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("ATL", "Atlanta, GA"),
        ("IAD", "Ashburn, VA"),
        ("BOS", "Boston, MA"),
        ("BUF", "Buffalo, NY"),
        ("CLT", "Charlotte, NC"),
        ("ORD", "Chicago, IL"),
        ("CMH", "Columbus, OH"),
        ("DFW", "Dallas, TX"),
        ("DEN", "Denver, CO"),
        ("DTW", "Detroit, MI"),
        ("HNL", "Honolulu, HI"),
        ("IAH", "Houston, TX"),
        ("IND", "Indianapolis, IN"),
        ("JAX", "Jacksonville, FL"),
        ("MCI", "Kansas City, MO"),
        ("LAS", "Las Vegas, NV"),
        ("LAX", "Los Angeles, CA"),
        ("MEM", "Memphis, TN"),
        ("MIA", "Miami, FL"),
        ("MSP", "Minneapolis, MN"),
        ("BNA", "Nashville, TN"),
        ("EWR", "Newark, NJ"),
        ("MSY", "New Orleans, LA"),
        ("JFK", "New York, NY"),
        ("OMA", "Omaha, NE"),
        ("PHL", "Philadelphia, PA"),
        ("PHX", "Phoenix, AZ"),
        ("PIT", "Pittsburgh, PA"),
        ("PDX", "Portland, OR"),
        ("RDU", "Raleigh, NC"),
        ("SMF", "Sacramento, CA"),
        ("SLC", "Salt Lake City, UT"),
        ("SAT", "San Antonio, TX"),
        ("SAN", "San Diego, CA"),
        ("SFO", "San Francisco, CA"),
        ("SJC", "San Jose, CA"),
        ("SEA", "Seattle, WA"),
        ("STL", "St. Louis, MO"),
        ("TPA", "Tampa, FL"),
        ("YYZ", "Toronto, ON"),
        ("YVR", "Vancouver, BC"),
        ("YUL", "Montreal, QC"),
        ("LHR", "London, UK"),
        ("CDG", "Paris, FR"),
        ("FRA", "Frankfurt, DE"),
        ("AMS", "Amsterdam, NL"),
        ("NRT", "Tokyo, JP"),
        ("SIN", "Singapore, SG"),
        ("SYD", "Sydney, AU"),
        ("GRU", "São Paulo, BR"),
        ("ICN", "Seoul, KR"),
        ("HKG", "Hong Kong, HK"),
        ("BOM", "Mumbai, IN"),
    ])
});

/// City name for a colo code, or the code itself when it is unknown.
pub fn colo_city(colo: &str) -> String {
    COLO_CITIES
        .get(colo)
        .map(|city| (*city).to_string())
        .unwrap_or_else(|| colo.to_string())
}

/// Fields of interest from a `/cdn-cgi/trace` response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceInfo {
    pub ip: String,
    pub colo: String,
    pub loc: String,
}

impl TraceInfo {
    /// Parse the newline-delimited `key=value` trace body.
    ///
    /// Lines without `=` and unknown keys are ignored. Only the first `=`
    /// splits a line, so values may contain `=` themselves.
    pub fn parse(body: &str) -> Self {
        let mut info = Self::default();
        for line in body.lines() {
            let Some((key, value)) = line.split_once('=') else {
                continue;
            };
            let value = value.trim_end_matches('\r').to_string();
            match key {
                "ip" => info.ip = value,
                "colo" => info.colo = value,
                "loc" => info.loc = value,
                _ => {}
            }
        }
        info
    }
}

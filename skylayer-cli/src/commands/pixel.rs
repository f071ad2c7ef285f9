//! Spatial index queries: pixel lookup, corners and neighbours.

use skylayer::healpix::{self, Frame, SkyPoint};

use crate::error::CliError;

/// Print the pixel containing an equatorial position.
///
/// With `galactic`, the pixel is the one a galactic-frame survey would use.
pub fn run_index(level: u8, ra: f64, dec: f64, galactic: bool) -> Result<(), CliError> {
    let frame = if galactic { Frame::Galactic } else { Frame::Equatorial };
    let pix = healpix::index_in_frame(frame, level, &SkyPoint::from_degrees(ra, dec))?;
    println!("{}", pix);
    Ok(())
}

/// Print the four corners of a pixel in degrees.
pub fn run_corners(level: u8, pix: u64) -> Result<(), CliError> {
    for line in corner_lines(level, pix)? {
        println!("{}", line);
    }
    Ok(())
}

/// Print the eight neighbours of a pixel, `-` where none exists.
pub fn run_neighbours(level: u8, pix: u64) -> Result<(), CliError> {
    println!("{}", neighbour_line(level, pix)?);
    Ok(())
}

fn corner_lines(level: u8, pix: u64) -> Result<Vec<String>, CliError> {
    let corners = healpix::corners(level, pix)?;
    Ok(corners
        .iter()
        .enumerate()
        .map(|(k, p)| format!("{}: ra={:.6} dec={:.6}", k, p.ra_degrees(), p.dec_degrees()))
        .collect())
}

fn neighbour_line(level: u8, pix: u64) -> Result<String, CliError> {
    healpix::validate(level, pix)?;
    let nside = healpix::nside(level)?;
    let names: Vec<String> = healpix::neighbours(nside, pix)?
        .iter()
        .map(|n| n.map_or_else(|| "-".to_string(), |p| p.to_string()))
        .collect();
    Ok(names.join(" "))
}

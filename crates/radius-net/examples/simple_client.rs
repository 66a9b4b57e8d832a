//! Sends one PAP Access-Request and prints the reply.
//!
//! ```text
//! cargo run --example simple_client -- <username> <password> <secret> [server_addr]
//! ```

use radius_net::client::Client;
use radius_proto::attributes::{self, Avp};
use radius_proto::auth::encode_user_password;
use radius_proto::{Dictionary, PacketCode};
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();
    if args.len() < 4 {
        eprintln!("Usage: {} <username> <password> <secret> [server_addr]", args[0]);
        eprintln!("Example: {} flopsy CGRateSPassword1 CGRateS.org 127.0.0.1:1812", args[0]);
        std::process::exit(1);
    }
    let username = &args[1];
    let password = &args[2];
    let secret = &args[3];
    let server_addr = args.get(4).map(String::as_str).unwrap_or("127.0.0.1:1812");

    let dict = Arc::new(Dictionary::rfc2865());
    let client = Client::new("udp", server_addr, secret, dict, 3, HashMap::new()).await?;

    let mut req = client.new_request(PacketCode::AccessRequest, 1);
    req.add_avp_with_name("User-Name", username, "")?;
    req.avps.push(Avp::from_raw(
        attributes::USER_PASSWORD,
        encode_user_password(password.as_bytes(), secret.as_bytes(), &req.authenticator),
    ));

    println!("Sending Access-Request to {server_addr}...");
    let mut rply = client.send_request(&mut req).await?;
    match rply.code {
        PacketCode::AccessAccept => println!("Authentication successful (Access-Accept)"),
        PacketCode::AccessReject => println!("Authentication failed (Access-Reject)"),
        code => println!("Unexpected reply: {code}"),
    }
    for avp in rply.attributes_with_name("Reply-Message", "") {
        println!("  Message: {}", avp.display_value());
    }
    Ok(())
}

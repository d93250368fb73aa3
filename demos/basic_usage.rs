//! Basic usage example for metabuf
//!
//! Run with: cargo run --example basic_usage

use std::io::Cursor;
use std::sync::Arc;

use metabuf::*;

fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect::<Vec<_>>().join(" ")
}

fn trade_type() -> Result<Arc<MessageType>> {
    let mut ty = MessageType::new();
    ty.add_field(1, "seq", Codec::UVarint, Flags::Required)?
        .add_field(2, "ts_ns", Codec::UInt64, Flags::Required)?
        .add_field(3, "price", Codec::Varint, Flags::Required)?
        .add_field(4, "qty", Codec::Int32, Flags::Simple)?
        .add_field(5, "symbol", Codec::Unicode, Flags::Simple)?
        .add_field(6, "note", Codec::Bytes, Flags::Simple)?;
    Ok(Arc::new(ty))
}

fn main() -> Result<()> {
    println!("metabuf Basic Usage Example");
    println!("===========================");

    let trade = trade_type()?;

    // Example 1: Required fields only
    println!("\n1. Simple Trade Message:");
    {
        let mut msg = trade.new_message();
        msg.set("seq", Value::UVarint(12345))?;
        msg.set("ts_ns", Value::UInt64(1_700_000_000_000_000_000))?;
        msg.set("price", Value::Varint(50_000_000))?;

        let bytes = msg.encode()?;
        println!("  Encoded {} bytes: {}", bytes.len(), hex(&bytes));

        let back = trade.decode(&bytes)?;
        println!(
            "  Decoded: seq={:?}, ts={:?}, price={:?}, symbol present={}",
            back.get("seq").and_then(Value::as_u64),
            back.get("ts_ns").and_then(Value::as_u64),
            back.get("price").and_then(Value::as_i64),
            back.contains("symbol"),
        );
    }

    // Example 2: Optional fields, and a missing required field
    println!("\n2. Trade Message with Optional Fields:");
    {
        let mut msg = trade.new_message();
        msg.set("seq", Value::UVarint(67890))?;
        msg.set("ts_ns", Value::UInt64(1_700_000_001_000_000_000))?;
        msg.set("price", Value::Varint(-25_500_000))?;
        msg.set("qty", Value::Int32(200))?;
        msg.set("symbol", "AAPL")?;
        msg.set("note", &b"Stop loss order"[..])?;

        let bytes = msg.encode()?;
        println!("  Encoded {} bytes", bytes.len());
        for (field, value) in trade.decode(&bytes)?.iter() {
            println!("    {} ({}): {:?}", field.name(), field.codec(), value);
        }

        msg.clear("price");
        match msg.encode() {
            Err(err) => println!("  Without price: {}", err),
            Ok(_) => println!("  Without price: unexpectedly encoded"),
        }
    }

    // Example 3: Repeated versus packed repeated
    println!("\n3. Repeated and Packed Fields:");
    {
        for flags in [Flags::Repeated, Flags::PackedRepeated] {
            let ty = Arc::new(MessageType::new().with_field(4, "levels", Codec::UVarint, flags)?);
            let mut msg = ty.new_message();
            msg.set_repeated("levels", [3u64, 270, 86942].map(Value::UVarint))?;
            let bytes = msg.encode()?;
            println!("  {:?}: {}", flags, hex(&bytes));
        }
    }

    // Example 4: Embedded messages
    println!("\n4. Embedded Message:");
    {
        let book = Arc::new(
            MessageType::new()
                .with_field(1, "venue", Codec::Unicode, Flags::Required)?
                .with_field(2, "trades", Codec::EmbeddedMessage(trade.clone()), Flags::Repeated)?,
        );

        let mut msg = book.new_message();
        msg.set("venue", "XNAS")?;
        for seq in 1..=3u64 {
            let mut t = trade.new_message();
            t.set("seq", Value::UVarint(seq))?;
            t.set("ts_ns", Value::UInt64(1_700_000_000_000_000_000 + seq))?;
            t.set("price", Value::Varint(50_000_000 - seq as i64))?;
            msg.push("trades", t)?;
        }

        let bytes = msg.encode()?;
        let back = book.decode(&bytes)?;
        let trades = back.get_repeated("trades").unwrap_or_default();
        println!("  Encoded {} bytes, {} trades decoded", bytes.len(), trades.len());
    }

    // Example 5: Sending the schema itself
    println!("\n5. Type Metadata:");
    {
        let envelope = Arc::new(
            MessageType::new()
                .with_field(1, "schema", Codec::TypeMetadata, Flags::Required)?
                .with_field(2, "payload", Codec::Bytes, Flags::Required)?,
        );

        let mut t = trade.new_message();
        t.set("seq", Value::UVarint(1))?;
        t.set("ts_ns", Value::UInt64(1_700_000_000_000_000_000))?;
        t.set("price", Value::Varint(50_000_000))?;

        let mut msg = envelope.new_message();
        msg.set("schema", trade.clone())?;
        msg.set("payload", t.encode()?)?;
        let bytes = msg.encode()?;
        println!("  Envelope is {} bytes", bytes.len());

        // A receiver with no prior knowledge of the trade schema
        let back = envelope.decode(&bytes)?;
        let schema = back
            .get("schema")
            .and_then(Value::as_type)
            .cloned()
            .ok_or_else(|| Error::MissingRequiredField("schema".to_owned()))?;
        let payload = back.get("payload").and_then(Value::as_bytes).unwrap_or_default();
        println!("  Received schema with {} fields:", schema.len());
        for field in schema.iter() {
            println!(
                "    {} {} {} {:?}",
                field.number(),
                field.name(),
                field.codec(),
                field.flags()
            );
        }
        println!("  Structurally equal to sender: {}", *schema == *trade);

        let decoded = schema.decode(payload)?;
        println!("  Payload decoded: {}", decoded == t);
    }

    // Example 6: Streaming from a reader
    println!("\n6. Streaming Decode:");
    {
        let mut msg = trade.new_message();
        msg.set("seq", Value::UVarint(42))?;
        msg.set("ts_ns", Value::UInt64(1_700_000_002_000_000_000))?;
        msg.set("price", Value::Varint(99_950_000))?;
        msg.set("symbol", "BTC/USD")?;

        let mut sink = Vec::new();
        msg.encode_to(&mut sink)?;
        let back = trade.decode_from(Cursor::new(sink))?;
        println!("  Stream round trip equal: {}", back == msg);
    }

    // Example 7: Unknown fields
    println!("\n7. Unknown Fields:");
    {
        let older = Arc::new(MessageType::new().with_field(1, "seq", Codec::UVarint, Flags::Required)?);
        let mut msg = trade.new_message();
        msg.set("seq", Value::UVarint(7))?;
        msg.set("ts_ns", Value::UInt64(1))?;
        msg.set("price", Value::Varint(-1))?;
        let bytes = msg.encode()?;

        let skipped = older.decode(&bytes)?;
        println!("  Skip policy: seq={:?}", skipped.get("seq").and_then(Value::as_u64));

        let strict = DecodeOptions {
            unknown_fields: UnknownFieldPolicy::Reject,
            ..DecodeOptions::default()
        };
        match older.decode_with(&bytes, &strict) {
            Err(err) => println!("  Reject policy: {}", err),
            Ok(_) => println!("  Reject policy: unexpectedly decoded"),
        }
    }

    // Example 8: Performance test
    println!("\n8. Performance Test:");
    {
        const N: usize = 10_000;

        let start = std::time::Instant::now();

        for i in 0..N {
            let mut msg = trade.new_message();
            msg.set("seq", Value::UVarint(i as u64))?;
            msg.set("ts_ns", Value::UInt64(1_700_000_000_000_000_000 + i as u64))?;
            msg.set("price", Value::Varint(50_000_000 + (i as i64 % 1000)))?;
            if i % 3 == 0 {
                msg.set("symbol", "AAPL")?;
            }
            let bytes = msg.encode()?;
            std::hint::black_box(trade.decode(&bytes)?);
        }

        let elapsed = start.elapsed();
        let ns_per_op = elapsed.as_nanos() as u64 / N as u64;
        let ops_per_sec = N as f64 / elapsed.as_secs_f64();

        println!("  {} roundtrips in {:.2}ms", N, elapsed.as_secs_f64() * 1000.0);
        println!("  {} ns/op, {:.0} ops/sec", ns_per_op, ops_per_sec);
    }

    println!("\nAll examples completed successfully!");
    Ok(())
}

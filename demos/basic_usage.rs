//! Basic usage example for ionbuf
//!
//! Run with: cargo run --example basic_usage

use ionbuf::*;

struct Trade {
    price: f64,
    quantity: i64,
    symbol: String,
    note: &'static str,
}

impl Record for Trade {
    fn describe(schema: &mut Schema<'_, Self>) {
        schema
            .field("price", |t| &t.price)
            .field("quantity", |t| &t.quantity)
            .field("symbol", |t| &t.symbol)
            .field("note", |t| &t.note);
    }
}

struct Order {
    id: u32,
    filled: bool,
    trade: Trade,
}

impl Record for Order {
    fn describe(schema: &mut Schema<'_, Self>) {
        schema
            .field("id", |o| &o.id)
            .field("filled", |o| &o.filled)
            .object("trade", |o| &o.trade);
    }
}

fn hex(bytes: &[u8]) -> String {
    bytes
        .iter()
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}

fn main() -> Result<()> {
    println!("ionbuf Basic Usage Example");
    println!("==========================");

    // Example 1: Primitive writers with manual framing
    println!("\n1. Primitive Writers:");
    {
        let mut buf = [0u8; 64];
        let mut index = write_object_begin(&mut buf, 0, LengthClass::U8)?;
        index += write_key(&mut buf, index, "price")?;
        index += write_float64(&mut buf, index, 50.25)?;
        index += write_key(&mut buf, index, "symbol")?;
        index += write_utf8(&mut buf, index, "AAPL")?;
        write_object_end(&mut buf, 0, LengthClass::U8, index - 2)?;

        println!("  Encoded {} bytes", index);
        println!("  {}", hex(&buf[..index]));
    }

    // Example 2: Object writer with cached keys
    println!("\n2. Object Writer:");
    {
        let trade = Trade {
            price: 50.25,
            quantity: 100,
            symbol: "AAPL".to_string(),
            note: "Stop loss order",
        };
        let writer = ObjectWriter::<Trade>::new()?;

        let mut buf = [0u8; 128];
        let size = writer.write_object(&trade, LengthClass::U8, &mut buf, 0)?;
        println!("  Encoded {} bytes", size);
        println!("  {}", hex(&buf[..size]));

        for field in writer.metadata().fields() {
            println!(
                "  {:<10} {:<14} key={:?}",
                field.name(),
                field.rust_type(),
                field.key()
            );
        }
    }

    // Example 3: Nested objects and exact pre-sizing
    println!("\n3. Nested Object:");
    {
        let order = Order {
            id: 7,
            filled: true,
            trade: Trade {
                price: -25.5,
                quantity: 200,
                symbol: "MSFT".to_string(),
                note: "",
            },
        };
        let writer = ObjectWriter::<Order>::new()?;

        let needed = writer.encoded_len(&order, LengthClass::U16);
        let mut buf = vec![0u8; needed];
        let size = writer.write_object(&order, LengthClass::U16, &mut buf, 0)?;
        println!("  Pre-sized {} bytes, wrote {}", needed, size);
        println!("  {}", hex(&buf));
    }

    // Example 4: Several objects in one buffer through an encoder
    println!("\n4. Encoder Stream:");
    {
        let writer = ObjectWriter::<Trade>::new()?;
        let trades = [
            Trade {
                price: 1.5,
                quantity: 10,
                symbol: "A".to_string(),
                note: "first",
            },
            Trade {
                price: 2.5,
                quantity: 20,
                symbol: "B".to_string(),
                note: "second",
            },
        ];

        let mut buf = [0u8; 256];
        let mut encoder = Encoder::new(&mut buf);
        for trade in &trades {
            writer.write_to(trade, LengthClass::U8, &mut encoder)?;
        }
        println!(
            "  Wrote {} objects in {} bytes",
            trades.len(),
            encoder.position()
        );
    }

    // Example 5: Error handling
    println!("\n5. Error Handling:");
    {
        let trade = Trade {
            price: 0.0,
            quantity: 0,
            symbol: "X".to_string(),
            note: "",
        };
        let writer = ObjectWriter::<Trade>::new()?;

        let mut small = [0u8; 8];
        match writer.write_object(&trade, LengthClass::U8, &mut small, 0) {
            Ok(_) => println!("  Unexpected success"),
            Err(e) => println!("  Expected error: {}", e),
        }

        struct Unsupported {
            big: u64,
        }

        impl Record for Unsupported {
            fn describe(schema: &mut Schema<'_, Self>) {
                schema.field("big", |u| &u.big);
            }
        }

        match ObjectWriter::<Unsupported>::new() {
            Ok(_) => println!("  Unexpected success"),
            Err(e) => println!("  Expected error: {}", e),
        }
    }

    println!("\nAll examples completed successfully!");
    Ok(())
}

#[cfg(test)]
mod test {
    use crate::{
        catalog::schema::{Column, Schema},
        db_types::{TypeId, Value},
        storage::{rid::Rid, tuple::Tuple},
    };

    #[test]
    fn tuple_round_trip_with_varchar() {
        let schema = Schema::new(vec![
            Column::new("id", TypeId::Integer),
            Column::new("name", TypeId::Varchar),
            Column::new("score", TypeId::Float),
        ]);

        let tuple = Tuple::from_values(
            &[
                Value::Integer(42),
                Value::Varchar(String::from("hello")),
                Value::Float(3.5),
            ],
            &schema,
        );

        assert_eq!(tuple.get_value(&schema, 0), Value::Integer(42));
        assert_eq!(
            tuple.get_value(&schema, 1),
            Value::Varchar(String::from("hello"))
        );
        let score = tuple.get_value(&schema, 2).as_float().unwrap();
        assert!((score - 3.5).abs() < f32::EPSILON);

        // Fixed portion plus the varchar payload: 4-byte prefix + "hello".
        assert_eq!(tuple.size(), schema.length() + 4 + 5);
    }

    #[test]
    fn every_value_kind_round_trips() {
        let schema = Schema::new(vec![
            Column::new("a", TypeId::Integer),
            Column::new("b", TypeId::Boolean),
            Column::new("c", TypeId::Varchar),
            Column::new("d", TypeId::Float),
            Column::new("e", TypeId::Varchar),
        ]);

        let values = [
            Value::Integer(-1),
            Value::Boolean(false),
            Value::Varchar(String::from("first tail entry")),
            Value::Float(-0.25),
            Value::Varchar(String::new()),
        ];
        let tuple = Tuple::from_values(&values, &schema);

        for (idx, expected) in values.iter().enumerate() {
            assert_eq!(&tuple.get_value(&schema, idx as u32), expected);
        }
    }

    #[test]
    fn multiple_varchars_stack_in_column_order() {
        let schema = Schema::new(vec![
            Column::new("first", TypeId::Varchar),
            Column::new("second", TypeId::Varchar),
        ]);

        let tuple = Tuple::from_values(
            &[
                Value::Varchar(String::from("aa")),
                Value::Varchar(String::from("bbb")),
            ],
            &schema,
        );

        // Two pointer slots, then payloads back to back.
        assert_eq!(schema.length(), 8);
        assert_eq!(tuple.size(), 8 + (4 + 2) + (4 + 3));

        let first_ptr = u32::from_le_bytes(tuple.data()[0..4].try_into().unwrap());
        let second_ptr = u32::from_le_bytes(tuple.data()[4..8].try_into().unwrap());
        assert_eq!(first_ptr, 8);
        assert_eq!(second_ptr, 8 + 4 + 2);
    }

    #[test]
    fn parsed_tuple_keeps_its_rid() {
        let schema = Schema::new(vec![Column::new("id", TypeId::Integer)]);
        let source = Tuple::from_values(&[Value::Integer(9)], &schema);

        let rid = Rid::new(3, 14);
        assert_eq!((rid.page_id(), rid.slot_num()), (3, 14));

        let mut parsed = Tuple::from_bytes(rid, source.data());
        assert_eq!(parsed.rid(), Some(rid));
        assert_eq!(parsed.get_value(&schema, 0), Value::Integer(9));

        let moved = Rid::new(4, 0);
        parsed.set_rid(moved);
        assert_eq!(parsed.rid(), Some(moved));
    }
}

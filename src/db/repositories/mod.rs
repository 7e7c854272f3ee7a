mod workout_records;
